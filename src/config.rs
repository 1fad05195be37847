//! Configuration loading via `ortho-config`.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::probe::{DEFAULT_SSH_PORT, ReachabilityPolicy};
use crate::readiness::ReadinessPoller;

/// Joyent CloudAPI credentials and endpoint derived from environment
/// variables and configuration files.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "JOYENT",
    discovery(
        app_name = "knife-joyent",
        env_var = "KNIFE_JOYENT_CONFIG_PATH",
        config_file_name = "knife-joyent.toml",
        dotfile_name = ".knife-joyent.toml",
        project_file_name = "knife-joyent.toml"
    )
)]
pub struct JoyentConfig {
    /// CloudAPI account name. Required.
    pub username: Option<String>,
    /// CloudAPI password. Required.
    pub password: Option<String>,
    /// CloudAPI endpoint for the target datacenter.
    #[ortho_config(default = "https://us-sw-1.api.joyentcloud.com".to_owned())]
    pub url: String,
    /// Value sent in the `X-Api-Version` header.
    #[ortho_config(default = "~6.5".to_owned())]
    pub api_version: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn missing(&self) -> ConfigError {
        ConfigError::MissingField(format!(
            "missing {}: set {} or add {} to knife-joyent.toml",
            self.description, self.env_var, self.toml_key
        ))
    }
}

fn require_field(value: Option<&str>, metadata: &FieldMetadata) -> Result<(), ConfigError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(()),
        _ => Err(metadata.missing()),
    }
}

const USERNAME: FieldMetadata = FieldMetadata::new("Joyent username", "JOYENT_USERNAME", "username");
const PASSWORD: FieldMetadata = FieldMetadata::new("Joyent password", "JOYENT_PASSWORD", "password");
const URL: FieldMetadata = FieldMetadata::new("Joyent CloudAPI URL", "JOYENT_URL", "url");

impl JoyentConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("knife-joyent")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_field(self.username.as_deref(), &USERNAME)?;
        require_field(self.password.as_deref(), &PASSWORD)?;
        require_field(Some(self.url.as_str()), &URL)?;
        Ok(())
    }

    /// Validated credentials as `(username, password)`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when either value is absent.
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        self.validate()?;
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(username), Some(password)) => Ok((username.trim(), password)),
            (None, _) => Err(USERNAME.missing()),
            (_, None) => Err(PASSWORD.missing()),
        }
    }

    /// Endpoint URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.url.trim().trim_end_matches('/')
    }
}

/// Timing knobs for readiness polling and SSH probing. Durations of zero
/// disable the corresponding limit.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "KNIFE_JOYENT_WAIT",
    discovery(
        app_name = "knife-joyent",
        env_var = "KNIFE_JOYENT_CONFIG_PATH",
        config_file_name = "knife-joyent.toml",
        dotfile_name = ".knife-joyent.toml",
        project_file_name = "knife-joyent.toml"
    )
)]
pub struct WaitConfig {
    /// Delay between machine state refreshes, in milliseconds.
    #[ortho_config(default = 1000)]
    pub poll_interval_ms: u64,
    /// Maximum time to wait for the machine to run, in seconds.
    #[ortho_config(default = 600)]
    pub ready_timeout_secs: u64,
    /// Bound on a single SSH connection attempt, in seconds.
    #[ortho_config(default = 5)]
    pub probe_timeout_secs: u64,
    /// Delay after a refused SSH connection, in seconds.
    #[ortho_config(default = 2)]
    pub refused_backoff_secs: u64,
    /// Delay after an unreachable host, in seconds.
    #[ortho_config(default = 2)]
    pub unreachable_backoff_secs: u64,
    /// Pause after SSH first answers, in seconds.
    #[ortho_config(default = 1)]
    pub settle_delay_secs: u64,
    /// Maximum time to wait for SSH, in seconds.
    #[ortho_config(default = 600)]
    pub ssh_timeout_secs: u64,
    /// Maximum number of SSH probes. Unlimited when unset.
    pub ssh_max_attempts: Option<u32>,
    /// Keep probing after the local system denies the connection. Off when
    /// unset.
    pub retry_permission_denied: Option<bool>,
}

const fn optional_secs(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

impl WaitConfig {
    /// Built-in timings used when nothing is configured.
    #[must_use]
    pub const fn builtin() -> Self {
        Self {
            poll_interval_ms: 1000,
            ready_timeout_secs: 600,
            probe_timeout_secs: 5,
            refused_backoff_secs: 2,
            unreachable_backoff_secs: 2,
            settle_delay_secs: 1,
            ssh_timeout_secs: 600,
            ssh_max_attempts: None,
            retry_permission_denied: None,
        }
    }

    /// Loads wait settings without parsing CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("knife-joyent")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Rejects settings that would make a probe attempt unbounded.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the probe timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe_timeout_secs == 0 {
            return Err(ConfigError::Invalid(String::from(
                "probe_timeout_secs must be greater than zero",
            )));
        }
        if self.ssh_max_attempts == Some(0) {
            return Err(ConfigError::Invalid(String::from(
                "ssh_max_attempts must be greater than zero when set",
            )));
        }
        Ok(())
    }

    /// Readiness poller configured from these settings.
    #[must_use]
    pub const fn readiness_poller(&self) -> ReadinessPoller {
        ReadinessPoller::new(Duration::from_millis(self.poll_interval_ms))
            .with_timeout(optional_secs(self.ready_timeout_secs))
    }

    /// Per-attempt bound for SSH probes.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Reachability retry policy configured from these settings.
    #[must_use]
    pub const fn reachability_policy(&self) -> ReachabilityPolicy {
        ReachabilityPolicy {
            port: DEFAULT_SSH_PORT,
            refused_backoff: Duration::from_secs(self.refused_backoff_secs),
            unreachable_backoff: Duration::from_secs(self.unreachable_backoff_secs),
            timeout_backoff: Duration::ZERO,
            settle_delay: Duration::from_secs(self.settle_delay_secs),
            max_attempts: self.ssh_max_attempts,
            deadline: optional_secs(self.ssh_timeout_secs),
            retry_permission_denied: matches!(self.retry_permission_denied, Some(true)),
        }
    }
}

/// Location of the `knife` executable used for bootstrapping.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "KNIFE",
    discovery(
        app_name = "knife-joyent",
        env_var = "KNIFE_JOYENT_CONFIG_PATH",
        config_file_name = "knife-joyent.toml",
        dotfile_name = ".knife-joyent.toml",
        project_file_name = "knife-joyent.toml"
    )
)]
pub struct KnifeConfig {
    /// Path to the `knife` executable.
    #[ortho_config(default = "knife".to_owned())]
    pub knife_bin: String,
}

impl KnifeConfig {
    /// Loads knife settings without parsing CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails, or
    /// [`ConfigError::MissingField`] when the executable path is blank.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        let config = Self::load_from_iter([OsString::from("knife-joyent")])
            .map_err(|err| ConfigError::Parse(err.to_string()))?;
        require_field(
            Some(config.knife_bin.as_str()),
            &FieldMetadata::new("knife executable", "KNIFE_KNIFE_BIN", "knife_bin"),
        )?;
        Ok(config)
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a value that is present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
