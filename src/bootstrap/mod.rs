//! Hand-off to the configuration-management bootstrap once SSH answers.
//!
//! The bootstrap itself is delegated to `knife bootstrap`, which installs
//! Chef on the node and converges the requested run-list. Its progress and
//! failures are reported by knife on the operator's terminal.

use std::ffi::OsString;
use std::future::Future;
use std::net::Ipv4Addr;
use std::pin::Pin;

use camino::Utf8PathBuf;
use shell_escape::unix::escape;
use thiserror::Error;
use tracing::{debug, warn};

mod runner;

pub use runner::{CommandRunner, CommandStatus, StreamingCommandRunner};

/// SSH user used when none is supplied.
pub const DEFAULT_SSH_USER: &str = "root";

/// Bootstrap template used when none is supplied.
pub const DEFAULT_DISTRO: &str = "chef-full";

/// Bootstrap settings collected from the command line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BootstrapOptions {
    /// Roles and recipes applied on first converge, in order.
    pub run_list: Vec<String>,
    /// SSH user for the bootstrap connection.
    pub ssh_user: String,
    /// Private key used for SSH authentication.
    pub identity_file: Option<Utf8PathBuf>,
    /// Explicit Chef node name.
    pub node_name: Option<String>,
    /// Install pre-release Chef packages.
    pub prerelease: bool,
    /// Bootstrap template name.
    pub distro: String,
    /// Verify the node's SSH host key.
    pub host_key_verify: bool,
    /// Chef environment for the node.
    pub environment: Option<String>,
    /// Stop after the machine is created.
    pub do_not_bootstrap: bool,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            run_list: Vec::new(),
            ssh_user: DEFAULT_SSH_USER.to_owned(),
            identity_file: None,
            node_name: None,
            prerelease: false,
            distro: DEFAULT_DISTRO.to_owned(),
            host_key_verify: true,
            environment: None,
            do_not_bootstrap: false,
        }
    }
}

/// Frozen bootstrap parameters for a single node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BootstrapSpec {
    /// Address the bootstrap connects to.
    pub address: Ipv4Addr,
    /// Roles and recipes applied on first converge.
    pub run_list: Vec<String>,
    /// SSH user.
    pub ssh_user: String,
    /// SSH private key.
    pub identity_file: Option<Utf8PathBuf>,
    /// Chef node name.
    pub node_name: String,
    /// Install pre-release Chef packages.
    pub prerelease: bool,
    /// Bootstrap template name.
    pub distro: String,
    /// Verify the node's SSH host key.
    pub host_key_verify: bool,
    /// Chef environment.
    pub environment: Option<String>,
}

impl BootstrapSpec {
    /// Combines the operator's options with the selected address. The
    /// explicit node name wins over `fallback_node_name`.
    #[must_use]
    pub fn new(options: &BootstrapOptions, address: Ipv4Addr, fallback_node_name: &str) -> Self {
        Self {
            address,
            run_list: options.run_list.clone(),
            ssh_user: options.ssh_user.clone(),
            identity_file: options.identity_file.clone(),
            node_name: options
                .node_name
                .clone()
                .unwrap_or_else(|| fallback_node_name.to_owned()),
            prerelease: options.prerelease,
            distro: options.distro.clone(),
            host_key_verify: options.host_key_verify,
            environment: options.environment.clone(),
        }
    }
}

/// How the bootstrap tool finished.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BootstrapStatus {
    /// Exit code of the bootstrap tool, if it reported one.
    pub exit_code: Option<i32>,
}

/// Errors raised when the bootstrap tool cannot be launched.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum BootstrapError {
    /// Raised when a command cannot be spawned.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Command that failed to start.
        program: String,
        /// Operating system error string.
        message: String,
    },
}

/// Future returned by bootstrap operations.
pub type BootstrapFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// External collaborator that configures a reachable node.
pub trait Bootstrapper {
    /// Error raised when the collaborator cannot run at all.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs the bootstrap to completion.
    fn run<'a>(&'a self, spec: &'a BootstrapSpec)
    -> BootstrapFuture<'a, BootstrapStatus, Self::Error>;
}

/// Bootstraps nodes by invoking `knife bootstrap`.
#[derive(Clone, Debug)]
pub struct KnifeBootstrapper<R> {
    knife_bin: String,
    runner: R,
}

impl KnifeBootstrapper<StreamingCommandRunner> {
    /// Convenience constructor that streams knife output to the terminal.
    #[must_use]
    pub fn streaming(knife_bin: impl Into<String>) -> Self {
        Self::new(knife_bin, StreamingCommandRunner)
    }
}

impl<R: CommandRunner> KnifeBootstrapper<R> {
    /// Creates a bootstrapper running `knife_bin` through `runner`.
    #[must_use]
    pub fn new(knife_bin: impl Into<String>, runner: R) -> Self {
        Self {
            knife_bin: knife_bin.into(),
            runner,
        }
    }

    /// Builds the `knife bootstrap` argument list for `spec`.
    #[must_use]
    pub fn knife_args(spec: &BootstrapSpec) -> Vec<OsString> {
        let mut args = vec![
            OsString::from("bootstrap"),
            OsString::from(spec.address.to_string()),
            OsString::from("--run-list"),
            OsString::from(spec.run_list.join(",")),
            OsString::from("--ssh-user"),
            OsString::from(&spec.ssh_user),
        ];

        if let Some(ref identity_file) = spec.identity_file {
            args.push(OsString::from("--identity-file"));
            args.push(OsString::from(expand_tilde(identity_file.as_str())));
        }

        args.push(OsString::from("--node-name"));
        args.push(OsString::from(&spec.node_name));

        if spec.prerelease {
            args.push(OsString::from("--prerelease"));
        }

        args.push(OsString::from("--distro"));
        args.push(OsString::from(&spec.distro));

        if let Some(ref environment) = spec.environment {
            args.push(OsString::from("--environment"));
            args.push(OsString::from(environment));
        }

        if !spec.host_key_verify {
            args.push(OsString::from("--no-host-key-verify"));
        }

        args
    }

    fn render_command(&self, args: &[OsString]) -> String {
        let mut rendered = escape(self.knife_bin.as_str().into()).into_owned();
        for arg in args {
            let text = arg.to_string_lossy();
            rendered.push(' ');
            rendered.push_str(&escape(text));
        }
        rendered
    }
}

impl<R> Bootstrapper for KnifeBootstrapper<R>
where
    R: CommandRunner + Sync,
{
    type Error = BootstrapError;

    fn run<'a>(
        &'a self,
        spec: &'a BootstrapSpec,
    ) -> BootstrapFuture<'a, BootstrapStatus, Self::Error> {
        Box::pin(async move {
            debug!(
                address = %spec.address,
                run_list = ?spec.run_list,
                ssh_user = %spec.ssh_user,
                identity_file = ?spec.identity_file,
                node_name = %spec.node_name,
                prerelease = spec.prerelease,
                distro = %spec.distro,
                environment = ?spec.environment,
                host_key_verify = spec.host_key_verify,
                "bootstrap parameters"
            );
            let args = Self::knife_args(spec);
            debug!(command = %self.render_command(&args), "running knife bootstrap");

            let status = self.runner.run(&self.knife_bin, &args)?;
            if !status.is_success() {
                warn!(exit_code = ?status.code, node = %spec.node_name, "knife bootstrap did not succeed");
            }
            Ok(BootstrapStatus {
                exit_code: status.code,
            })
        })
    }
}

/// Splits a run-list argument on commas and whitespace, dropping empties.
#[must_use]
pub fn parse_run_list(raw: &str) -> Vec<String> {
    raw.split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Expands a leading `~/` prefix to the user's home directory.
///
/// The input is returned unchanged when `HOME` is not set.
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return format!("{}/{rest}", home.to_string_lossy());
    }
    path.to_owned()
}
