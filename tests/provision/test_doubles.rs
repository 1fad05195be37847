//! Test doubles for the provisioning orchestrator.
//!
//! Each double shares its state behind an `Arc` so clones handed to the
//! orchestrator can still be inspected by the test afterwards.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use knife_joyent::{
    BootstrapSpec, BootstrapStatus, Bootstrapper, CreateOutcome, Flavor, OnOpen, ProbeOutcome,
    Provider, ProviderMessage, ProvisionRequest, ProvisionedResource, ReachabilityProbe,
    ResourceState,
};
use knife_joyent::bootstrap::BootstrapFuture;
use knife_joyent::probe::ProbeFuture;
use knife_joyent::provider::ProviderFuture;
use thiserror::Error;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|err| panic!("test double lock poisoned: {err}"))
}

/// Builds a machine snapshot in `state` with the given addresses.
pub fn machine(id: &str, name: &str, state: ResourceState, addresses: &[&str]) -> ProvisionedResource {
    ProvisionedResource {
        id: id.to_owned(),
        name: name.to_owned(),
        state,
        resource_type: String::from("virtualmachine"),
        dataset: String::from("img-1"),
        addresses: addresses.iter().map(|ip| (*ip).to_owned()).collect(),
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ScriptedProviderError {
    #[error("transport failure: {0}")]
    Transport(String),
}

#[derive(Debug, Default)]
struct ProviderState {
    create: Option<Result<CreateOutcome, ScriptedProviderError>>,
    refreshes: VecDeque<Result<ProvisionedResource, ScriptedProviderError>>,
    requests: Vec<ProvisionRequest>,
    refresh_calls: u32,
}

/// Provider that replays a scripted create outcome and refresh sequence.
#[derive(Clone, Debug, Default)]
pub struct ScriptedProvider {
    state: Arc<Mutex<ProviderState>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_returns(&self, resource: ProvisionedResource) {
        lock(&self.state).create = Some(Ok(CreateOutcome::Created(resource)));
    }

    pub fn create_rejects(&self, message: &str) {
        lock(&self.state).create = Some(Ok(CreateOutcome::Rejected(ProviderMessage {
            code: None,
            message: message.to_owned(),
        })));
    }

    pub fn create_fails(&self, message: &str) {
        lock(&self.state).create = Some(Err(ScriptedProviderError::Transport(message.to_owned())));
    }

    pub fn then_refresh(&self, resource: ProvisionedResource) {
        lock(&self.state).refreshes.push_back(Ok(resource));
    }

    pub fn then_refresh_fails(&self, message: &str) {
        lock(&self.state)
            .refreshes
            .push_back(Err(ScriptedProviderError::Transport(message.to_owned())));
    }

    pub fn refresh_calls(&self) -> u32 {
        lock(&self.state).refresh_calls
    }

    pub fn create_requests(&self) -> Vec<ProvisionRequest> {
        lock(&self.state).requests.clone()
    }
}

impl Provider for ScriptedProvider {
    type Error = ScriptedProviderError;

    fn create<'a>(
        &'a self,
        request: &'a ProvisionRequest,
    ) -> ProviderFuture<'a, CreateOutcome, Self::Error> {
        Box::pin(async move {
            let mut state = lock(&self.state);
            state.requests.push(request.clone());
            state.create.take().unwrap_or_else(|| {
                Err(ScriptedProviderError::Transport(String::from(
                    "no scripted create outcome",
                )))
            })
        })
    }

    fn refresh<'a>(&'a self, id: &'a str) -> ProviderFuture<'a, ProvisionedResource, Self::Error> {
        Box::pin(async move {
            let mut state = lock(&self.state);
            state.refresh_calls += 1;
            state.refreshes.pop_front().unwrap_or_else(|| {
                Err(ScriptedProviderError::Transport(format!(
                    "no scripted refresh for {id}"
                )))
            })
        })
    }

    fn list_flavors(&self) -> ProviderFuture<'_, Vec<Flavor>, Self::Error> {
        Box::pin(async {
            Err(ScriptedProviderError::Transport(String::from(
                "flavor listing is not scripted",
            )))
        })
    }
}

pub const TEST_BANNER: &str = "SSH-2.0-OpenSSH_9.6";

#[derive(Debug, Default)]
struct ProberState {
    outcomes: VecDeque<ProbeOutcome>,
    targets: Vec<SocketAddr>,
    actions_run: u32,
}

/// Prober that replays scripted outcomes; runs the on-open action for
/// [`ProbeOutcome::Open`] and keeps answering `Refused` once exhausted.
#[derive(Clone, Debug, Default)]
pub struct ScriptedProber {
    state: Arc<Mutex<ProberState>>,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(&self, outcome: ProbeOutcome) -> &Self {
        lock(&self.state).outcomes.push_back(outcome);
        self
    }

    pub fn refuse_times(&self, count: u32) -> &Self {
        for _ in 0..count {
            self.then(ProbeOutcome::Refused);
        }
        self
    }

    pub fn attempts(&self) -> usize {
        lock(&self.state).targets.len()
    }

    pub fn targets(&self) -> Vec<SocketAddr> {
        lock(&self.state).targets.clone()
    }

    pub fn actions_run(&self) -> u32 {
        lock(&self.state).actions_run
    }
}

impl ReachabilityProbe for ScriptedProber {
    fn probe<'a>(&'a self, target: SocketAddr, on_open: OnOpen<'a>) -> ProbeFuture<'a> {
        Box::pin(async move {
            let outcome = {
                let mut state = lock(&self.state);
                state.targets.push(target);
                state.outcomes.pop_front().unwrap_or(ProbeOutcome::Refused)
            };
            if outcome.is_open() {
                on_open(Some(TEST_BANNER)).map_err(|source| {
                    knife_joyent::ProbeError::Action { target, source }
                })?;
                lock(&self.state).actions_run += 1;
            }
            Ok(outcome)
        })
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RecordingBootstrapperError {
    #[error("knife is not installed")]
    Missing,
}

#[derive(Debug, Default)]
struct BootstrapperState {
    specs: Vec<BootstrapSpec>,
    exit_code: Option<i32>,
    fail: bool,
}

/// Bootstrapper that records every spec it is asked to run.
#[derive(Clone, Debug, Default)]
pub struct RecordingBootstrapper {
    state: Arc<Mutex<BootstrapperState>>,
}

impl RecordingBootstrapper {
    pub fn new() -> Self {
        let bootstrapper = Self::default();
        lock(&bootstrapper.state).exit_code = Some(0);
        bootstrapper
    }

    pub fn exits_with(&self, code: i32) {
        lock(&self.state).exit_code = Some(code);
    }

    pub fn fail_to_start(&self) {
        lock(&self.state).fail = true;
    }

    pub fn specs(&self) -> Vec<BootstrapSpec> {
        lock(&self.state).specs.clone()
    }
}

impl Bootstrapper for RecordingBootstrapper {
    type Error = RecordingBootstrapperError;

    fn run<'a>(
        &'a self,
        spec: &'a BootstrapSpec,
    ) -> BootstrapFuture<'a, BootstrapStatus, Self::Error> {
        Box::pin(async move {
            let mut state = lock(&self.state);
            if state.fail {
                return Err(RecordingBootstrapperError::Missing);
            }
            state.specs.push(spec.clone());
            Ok(BootstrapStatus {
                exit_code: state.exit_code,
            })
        })
    }
}
