//! Command-line interface definitions for the `knife-joyent` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Parser, Subcommand};

/// Top-level CLI for the `knife-joyent` binary.
#[derive(Debug, Parser)]
#[command(
    name = "knife-joyent",
    about = "Provision Joyent machines and hand them to knife bootstrap",
    version,
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Manage machines.
    #[command(name = "server", subcommand)]
    Server(ServerCommand),
    /// Inspect provider packages.
    #[command(name = "flavor", subcommand)]
    Flavor(FlavorCommand),
}

/// Subcommands of `knife-joyent server`.
#[derive(Debug, Subcommand)]
pub(crate) enum ServerCommand {
    /// Create a machine and bootstrap it with Chef.
    #[command(name = "create")]
    Create(CreateCommand),
}

/// Subcommands of `knife-joyent flavor`.
#[derive(Debug, Subcommand)]
pub(crate) enum FlavorCommand {
    /// List available packages sorted by memory.
    #[command(name = "list")]
    List,
}

/// Arguments for `knife-joyent server create`.
#[derive(Debug, Parser)]
pub(crate) struct CreateCommand {
    /// Name of the machine.
    #[arg(long, value_name = "NAME")]
    pub(crate) name: Option<String>,
    /// Package (flavor) of the machine.
    #[arg(short = 'f', long, value_name = "FLAVOR")]
    pub(crate) flavor: String,
    /// Dataset (image) of the machine.
    #[arg(short = 'I', long, value_name = "IMAGE")]
    pub(crate) image: String,
    /// Comma separated list of roles and recipes.
    #[arg(short = 'r', long, value_name = "RUN_LIST", default_value = "")]
    pub(crate) run_list: String,
    /// SSH user for the bootstrap connection.
    #[arg(short = 'x', long, value_name = "USERNAME", default_value = "root")]
    pub(crate) ssh_user: String,
    /// SSH identity file used for authentication.
    #[arg(short = 'i', long, value_name = "IDENTITY_FILE")]
    pub(crate) identity_file: Option<String>,
    /// Chef node name; defaults to the machine name, then its id.
    #[arg(short = 'N', long, value_name = "NAME")]
    pub(crate) node_name: Option<String>,
    /// Install the pre-release Chef gems.
    #[arg(long)]
    pub(crate) prerelease: bool,
    /// Bootstrap template.
    #[arg(short = 'd', long, value_name = "DISTRO", default_value = "chef-full")]
    pub(crate) distro: String,
    /// Chef environment for the node.
    #[arg(short = 'E', long, value_name = "ENVIRONMENT")]
    pub(crate) environment: Option<String>,
    /// Disable host key verification for the bootstrap connection.
    #[arg(long = "no-host-key-verify")]
    pub(crate) no_host_key_verify: bool,
    /// Stop once the machine is running.
    #[arg(long)]
    pub(crate) do_not_bootstrap: bool,
}
