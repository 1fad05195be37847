//! Shared fixtures for provisioning scenarios.

use std::time::Duration;

use knife_joyent::{
    BootstrapOptions, ProvisionError, ProvisionOrchestrator, ProvisionOutcome, ProvisionRequest,
    ReachabilityPolicy, ReadinessPoller,
};
use rstest::fixture;

use super::test_doubles::{
    RecordingBootstrapper, RecordingBootstrapperError, ScriptedProber, ScriptedProvider,
    ScriptedProviderError,
};

pub type Orchestrator = ProvisionOrchestrator<ScriptedProvider, ScriptedProber, RecordingBootstrapper>;
pub type OrchestratorError = ProvisionError<ScriptedProviderError, RecordingBootstrapperError>;

#[derive(Clone, Debug)]
pub struct ProvisionContext {
    pub provider: ScriptedProvider,
    pub prober: ScriptedProber,
    pub bootstrapper: RecordingBootstrapper,
    pub machine_id: String,
    pub request: ProvisionRequest,
    pub options: BootstrapOptions,
    pub policy: ReachabilityPolicy,
    pub poller: ReadinessPoller,
    pub outcome: Option<ProvisionResult>,
    pub output: String,
}

#[derive(Clone, Debug)]
pub enum ProvisionResult {
    Finished(ProvisionOutcome),
    Failed(String),
}

#[fixture]
pub fn provision_context() -> ProvisionContext {
    ProvisionContext {
        provider: ScriptedProvider::new(),
        prober: ScriptedProber::new(),
        bootstrapper: RecordingBootstrapper::new(),
        machine_id: String::from("srv-123"),
        request: request("web1"),
        options: BootstrapOptions::default(),
        policy: ReachabilityPolicy::immediate(),
        poller: ReadinessPoller::new(Duration::ZERO),
        outcome: None,
        output: String::new(),
    }
}

pub fn request(name: &str) -> ProvisionRequest {
    ProvisionRequest::builder()
        .name(Some(name.to_owned()))
        .image("img-1")
        .flavor("g4-highcpu-1")
        .build()
        .unwrap_or_else(|err| panic!("request fixture should be valid: {err}"))
}

impl ProvisionContext {
    pub fn orchestrator(&self) -> Orchestrator {
        ProvisionOrchestrator::new(
            self.provider.clone(),
            self.prober.clone(),
            self.bootstrapper.clone(),
        )
        .with_readiness_poller(self.poller)
        .with_reachability_policy(self.policy)
    }

    /// Runs the orchestrator, capturing its progress output.
    pub async fn run(&self) -> (Result<ProvisionOutcome, OrchestratorError>, String) {
        let mut out = Vec::new();
        let result = self
            .orchestrator()
            .provision(&self.request, &self.options, &mut out)
            .await;
        (result, String::from_utf8_lossy(&out).into_owned())
    }
}
