//! Errors surfaced by the provisioning workflow.

use std::net::{Ipv4Addr, SocketAddr};

use thiserror::Error;

use crate::probe::ProbeError;

/// Errors that abort provisioning before the sequence completes.
///
/// Structured create rejections are not errors; they are reported through
/// [`super::ProvisionOutcome::Rejected`].
#[derive(Debug, Error)]
pub enum ProvisionError<ProviderError, BootstrapError>
where
    ProviderError: std::error::Error + 'static,
    BootstrapError: std::error::Error + 'static,
{
    /// Raised when the create call fails without a decodable error body.
    #[error("failed to create machine: {0}")]
    Create(#[source] ProviderError),
    /// Raised when refreshing the machine state fails.
    #[error("failed to refresh machine state: {0}")]
    Refresh(#[source] ProviderError),
    /// Raised when the machine enters a terminal failure state.
    #[error("machine {id} entered terminal state '{state}'")]
    ResourceFailed {
        /// Machine identifier.
        id: String,
        /// Last observed state label.
        state: String,
    },
    /// Raised when the machine is still not ready after the polling budget.
    #[error("machine {id} not ready after {attempts} checks")]
    ReadinessTimeout {
        /// Machine identifier.
        id: String,
        /// Number of refreshes performed.
        attempts: u32,
    },
    /// Raised when none of the machine's addresses is publicly routable.
    #[error("machine {id} has no public IPv4 address (candidates: [{}])", addresses.join(", "))]
    NoPublicAddress {
        /// Machine identifier.
        id: String,
        /// Addresses reported by the provider.
        addresses: Vec<String>,
    },
    /// Raised when the local system denies the SSH probe.
    #[error("permission denied while connecting to {target}")]
    PermissionDenied {
        /// Address being probed.
        target: SocketAddr,
    },
    /// Raised when SSH never answered within the probing budget.
    #[error("SSH on {address} did not become reachable after {attempts} attempts")]
    SshUnreachable {
        /// Address being probed.
        address: Ipv4Addr,
        /// Number of probes performed.
        attempts: u32,
    },
    /// Raised when a probe fails outside the retry model.
    #[error(transparent)]
    Probe(#[from] ProbeError),
    /// Raised when the bootstrap collaborator cannot run.
    #[error("bootstrap failed: {0}")]
    Bootstrap(#[source] BootstrapError),
}
