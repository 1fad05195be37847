//! Core library for the knife-joyent provisioning tool.
//!
//! The crate creates machines through a provider abstraction (with a Joyent
//! CloudAPI implementation), waits until they are running, picks a public
//! address, probes SSH until it answers and hands the node to
//! `knife bootstrap`.

pub mod address;
pub mod bootstrap;
pub mod config;
pub mod flavors;
pub mod joyent;
pub mod probe;
pub mod provider;
pub mod provision;
pub mod readiness;
pub mod test_support;

pub use address::{
    AddressCandidate, AddressClass, AddressError, classify, classify_addr, select_public_address,
};
pub use bootstrap::{
    BootstrapError, BootstrapOptions, BootstrapSpec, BootstrapStatus, Bootstrapper,
    CommandRunner, CommandStatus, KnifeBootstrapper, StreamingCommandRunner, parse_run_list,
};
pub use config::{ConfigError, JoyentConfig, KnifeConfig, WaitConfig};
pub use flavors::render_flavor_table;
pub use joyent::{JoyentError, JoyentProvider};
pub use probe::{
    OnOpen, ProbeError, ProbeOutcome, ReachabilityPolicy, ReachabilityProbe, TcpProber,
};
pub use provider::{
    CreateOutcome, Flavor, Provider, ProviderMessage, ProvisionRequest, ProvisionRequestBuilder,
    ProvisionedResource, RequestError, ResourceState,
};
pub use provision::{ProvisionError, ProvisionOrchestrator, ProvisionOutcome};
pub use readiness::{PollError, Readiness, ReadinessPoller, ReadinessState};
