//! Retry policy applied between reachability probes.

use std::time::Duration;

use super::{DEFAULT_SSH_PORT, ProbeOutcome};

/// Controls how the orchestrator retries probes until SSH answers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReachabilityPolicy {
    /// Port to probe.
    pub port: u16,
    /// Delay after a refused connection.
    pub refused_backoff: Duration,
    /// Delay after an unreachable host.
    pub unreachable_backoff: Duration,
    /// Delay after a plain timeout. The timeout itself already waited.
    pub timeout_backoff: Duration,
    /// Pause after the first successful probe so sshd can finish starting.
    pub settle_delay: Duration,
    /// Maximum number of probes; `None` keeps probing.
    pub max_attempts: Option<u32>,
    /// Overall time budget; `None` keeps probing.
    pub deadline: Option<Duration>,
    /// Keep retrying after `PermissionDenied` instead of failing.
    pub retry_permission_denied: bool,
}

impl Default for ReachabilityPolicy {
    fn default() -> Self {
        Self {
            port: DEFAULT_SSH_PORT,
            refused_backoff: Duration::from_secs(2),
            unreachable_backoff: Duration::from_secs(2),
            timeout_backoff: Duration::ZERO,
            settle_delay: Duration::from_secs(1),
            max_attempts: None,
            deadline: Some(Duration::from_secs(600)),
            retry_permission_denied: false,
        }
    }
}

impl ReachabilityPolicy {
    /// Policy without any waiting, used to keep tests fast.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            port: DEFAULT_SSH_PORT,
            refused_backoff: Duration::ZERO,
            unreachable_backoff: Duration::ZERO,
            timeout_backoff: Duration::ZERO,
            settle_delay: Duration::ZERO,
            max_attempts: None,
            deadline: None,
            retry_permission_denied: false,
        }
    }

    /// Delay to apply before probing again after `outcome`.
    #[must_use]
    pub const fn backoff_for(&self, outcome: ProbeOutcome) -> Duration {
        match outcome {
            ProbeOutcome::Refused => self.refused_backoff,
            ProbeOutcome::Unreachable => self.unreachable_backoff,
            ProbeOutcome::TimedOut | ProbeOutcome::PermissionDenied => self.timeout_backoff,
            ProbeOutcome::Open => Duration::ZERO,
        }
    }

    /// Returns `true` when `outcome` should end probing with an error.
    #[must_use]
    pub const fn is_fatal(&self, outcome: ProbeOutcome) -> bool {
        matches!(outcome, ProbeOutcome::PermissionDenied) && !self.retry_permission_denied
    }
}
