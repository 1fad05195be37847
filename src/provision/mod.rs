//! Orchestrates machine creation through to the bootstrap handoff.
//!
//! The workflow creates a machine via a [`Provider`], polls it until ready,
//! prints a summary, selects a public address, probes SSH until it answers
//! and finally delegates to a [`Bootstrapper`]. Each stage runs to
//! completion before the next begins.

use std::io::Write;
use std::net::{Ipv4Addr, SocketAddr};

use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::address::select_public_address;
use crate::bootstrap::{BootstrapOptions, BootstrapSpec, BootstrapStatus, Bootstrapper};
use crate::probe::{OnOpen, ReachabilityPolicy, ReachabilityProbe};
use crate::provider::{
    CreateOutcome, Provider, ProviderMessage, ProvisionRequest, ProvisionedResource,
};
use crate::readiness::{PollError, ReadinessPoller};

mod error;
mod report;

pub use error::ProvisionError;

use report::{NO_BOOTSTRAP_NOTE, SMARTOS_NOTE, mark, say, write_summary};

const SMARTMACHINE_TYPE: &str = "smartmachine";

/// How a provisioning run ended without an error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProvisionOutcome {
    /// The provider refused the create request with a structured message.
    Rejected {
        /// Message decoded from the provider's error body.
        message: ProviderMessage,
    },
    /// The machine is ready and bootstrapping was skipped on request.
    Created {
        /// Final machine snapshot.
        resource: ProvisionedResource,
    },
    /// The machine is ready and the bootstrap collaborator ran to completion.
    Bootstrapped {
        /// Final machine snapshot.
        resource: ProvisionedResource,
        /// Address that was probed and bootstrapped.
        address: Ipv4Addr,
        /// Status reported by the collaborator.
        status: BootstrapStatus,
    },
}

impl ProvisionOutcome {
    /// Process exit code for this outcome.
    ///
    /// Only a structured rejection fails the run; the bootstrap collaborator
    /// reports its own status through its own output.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Rejected { .. } => 1,
            Self::Created { .. } | Self::Bootstrapped { .. } => 0,
        }
    }
}

type ProvisionResult<T, P, B> =
    Result<T, ProvisionError<<P as Provider>::Error, <B as Bootstrapper>::Error>>;

/// Drives the create, wait, probe and bootstrap sequence.
#[derive(Debug)]
pub struct ProvisionOrchestrator<P, T, B> {
    provider: P,
    prober: T,
    bootstrapper: B,
    readiness: ReadinessPoller,
    reachability: ReachabilityPolicy,
}

impl<P, T, B> ProvisionOrchestrator<P, T, B>
where
    P: Provider,
    T: ReachabilityProbe,
    B: Bootstrapper,
{
    /// Creates an orchestrator with default polling and probing budgets.
    #[must_use]
    pub fn new(provider: P, prober: T, bootstrapper: B) -> Self {
        Self {
            provider,
            prober,
            bootstrapper,
            readiness: ReadinessPoller::default(),
            reachability: ReachabilityPolicy::default(),
        }
    }

    /// Overrides the readiness polling budget.
    #[must_use]
    pub const fn with_readiness_poller(mut self, readiness: ReadinessPoller) -> Self {
        self.readiness = readiness;
        self
    }

    /// Overrides the SSH probing policy.
    #[must_use]
    pub const fn with_reachability_policy(mut self, reachability: ReachabilityPolicy) -> Self {
        self.reachability = reachability;
        self
    }

    /// Runs the full sequence, writing progress to `out`.
    ///
    /// A create request the provider rejects with a structured message is
    /// returned as [`ProvisionOutcome::Rejected`] without polling; reporting
    /// it is left to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError`] when the provider fails at the transport
    /// level, the machine never becomes ready, no public address exists, SSH
    /// never answers, or the bootstrap collaborator cannot run.
    pub async fn provision<W: Write + Send>(
        &self,
        request: &ProvisionRequest,
        options: &BootstrapOptions,
        out: &mut W,
    ) -> ProvisionResult<ProvisionOutcome, P, B> {
        match options.node_name.as_deref().or(request.name.as_deref()) {
            Some(label) => say(out, format_args!("Creating machine {label}")),
            None => say(out, format_args!("Creating machine from {}", request.image)),
        }

        let created = match self
            .provider
            .create(request)
            .await
            .map_err(ProvisionError::Create)?
        {
            CreateOutcome::Created(resource) => resource,
            CreateOutcome::Rejected(message) => {
                return Ok(ProvisionOutcome::Rejected { message });
            }
        };
        info!(id = %created.id, "machine created");

        let resource = self.wait_until_ready(&created.id, out).await?;
        write_summary(out, &resource);

        if options.do_not_bootstrap {
            say(out, format_args!("{NO_BOOTSTRAP_NOTE}"));
            return Ok(ProvisionOutcome::Created { resource });
        }

        let Some(address) = select_public_address(&resource.addresses) else {
            return Err(ProvisionError::NoPublicAddress {
                id: resource.id,
                addresses: resource.addresses,
            });
        };
        say(out, format_args!("Attempting to bootstrap on {address}"));
        if resource.resource_type == SMARTMACHINE_TYPE {
            say(out, format_args!("{SMARTOS_NOTE}"));
        }

        let attempts = self.wait_for_ssh(address, out).await?;
        debug!(%address, attempts, "ssh reachable");

        let fallback = request.name.as_deref().unwrap_or(&resource.id);
        let spec = BootstrapSpec::new(options, address, fallback);
        let status = self
            .bootstrapper
            .run(&spec)
            .await
            .map_err(ProvisionError::Bootstrap)?;

        Ok(ProvisionOutcome::Bootstrapped {
            resource,
            address,
            status,
        })
    }

    async fn wait_until_ready<W: Write>(
        &self,
        id: &str,
        out: &mut W,
    ) -> ProvisionResult<ProvisionedResource, P, B> {
        let result = self
            .readiness
            .wait_until_ready(|| self.provider.refresh(id), |_, _| mark(out, "."))
            .await;
        mark(out, "\n");

        result.map_err(|err| match err {
            PollError::Refresh(source) => ProvisionError::Refresh(source),
            PollError::Terminal(last) => ProvisionError::ResourceFailed {
                id: last.id,
                state: last.state.label().to_owned(),
            },
            PollError::Exhausted { attempts, last } => ProvisionError::ReadinessTimeout {
                id: last.id,
                attempts,
            },
        })
    }

    /// Probes SSH until it answers, returning the number of attempts.
    async fn wait_for_ssh<W: Write + Send>(
        &self,
        address: Ipv4Addr,
        out: &mut W,
    ) -> ProvisionResult<u32, P, B> {
        let policy = self.reachability;
        let target = SocketAddr::from((address, policy.port));
        let deadline = policy
            .deadline
            .and_then(|budget| Instant::now().checked_add(budget));
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);
            let on_open: OnOpen<'_> = Box::new(|banner: Option<&str>| {
                debug!(%target, banner = banner.unwrap_or_default(), "sshd answered");
                say(out, format_args!("done"));
                Ok(())
            });
            let outcome = self.prober.probe(target, on_open).await?;
            debug!(%target, attempts, ?outcome, "ssh probe finished");

            if outcome.is_open() {
                sleep(policy.settle_delay).await;
                return Ok(attempts);
            }
            if policy.is_fatal(outcome) {
                mark(out, "\n");
                return Err(ProvisionError::PermissionDenied { target });
            }

            mark(out, ".");
            let out_of_attempts = policy.max_attempts.is_some_and(|max| attempts >= max);
            let out_of_time = deadline.is_some_and(|at| Instant::now() >= at);
            if out_of_attempts || out_of_time {
                mark(out, "\n");
                return Err(ProvisionError::SshUnreachable { address, attempts });
            }

            sleep(policy.backoff_for(outcome)).await;
        }
    }
}
