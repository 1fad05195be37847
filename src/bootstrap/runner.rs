//! Command runner abstraction used to launch the bootstrap tool.

use std::ffi::OsString;
use std::process::Command;

use super::BootstrapError;

/// Exit status of an external command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CommandStatus {
    /// Exit code reported by the process, if available.
    pub code: Option<i32>,
}

impl CommandStatus {
    /// Returns `true` when the exit code equals zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Abstraction over command execution to support fakes in tests.
pub trait CommandRunner {
    /// Runs `program` with the given arguments to completion.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Spawn`] if the command cannot be started.
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandStatus, BootstrapError>;
}

/// Runs commands attached to the current terminal so their output streams
/// straight to the operator.
#[derive(Clone, Copy, Debug, Default)]
pub struct StreamingCommandRunner;

impl CommandRunner for StreamingCommandRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandStatus, BootstrapError> {
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|err| BootstrapError::Spawn {
                program: program.to_owned(),
                message: err.to_string(),
            })?;

        Ok(CommandStatus {
            code: status.code(),
        })
    }
}
