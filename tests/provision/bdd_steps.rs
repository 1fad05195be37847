//! BDD step definitions for `knife-joyent server create`.

use std::convert::Infallible;

use knife_joyent::{ProbeOutcome, ProvisionOutcome, ResourceState};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_doubles::machine;
use super::test_helpers::{ProvisionContext, ProvisionResult};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("the provider creates machine \"{id}\"")]
fn provider_creates(mut provision_context: ProvisionContext, id: String) -> Result<ProvisionContext, Infallible> {
    provision_context.provider.create_returns(machine(
        &id,
        "web1",
        ResourceState::Creating,
        &[],
    ));
    provision_context.machine_id = id;
    Ok(provision_context)
}

#[given("the provider rejects the request with \"{message}\"")]
fn provider_rejects(provision_context: ProvisionContext, message: String) -> Result<ProvisionContext, Infallible> {
    provision_context.provider.create_rejects(&message);
    Ok(provision_context)
}

#[given(
    "the machine is still creating for \"{pending}\" refreshes, then runs with addresses \"{addresses}\""
)]
fn machine_becomes_ready(
    provision_context: ProvisionContext,
    pending: u32,
    addresses: String,
) -> Result<ProvisionContext, Infallible> {
    let id = provision_context.machine_id.as_str();
    for _ in 0..pending {
        provision_context
            .provider
            .then_refresh(machine(id, "web1", ResourceState::Creating, &[]));
    }
    let ips: Vec<&str> = addresses.split(',').map(str::trim).collect();
    provision_context
        .provider
        .then_refresh(machine(id, "web1", ResourceState::Ready, &ips));
    Ok(provision_context)
}

#[given("SSH answers on the first probe")]
fn ssh_answers(provision_context: ProvisionContext) -> Result<ProvisionContext, Infallible> {
    provision_context.prober.then(ProbeOutcome::Open);
    Ok(provision_context)
}

#[given("SSH refuses \"{count}\" connections before answering")]
fn ssh_refuses(provision_context: ProvisionContext, count: u32) -> Result<ProvisionContext, Infallible> {
    provision_context
        .prober
        .refuse_times(count)
        .then(ProbeOutcome::Open);
    Ok(provision_context)
}

#[given("SSH probes are denied by the local system")]
fn ssh_denied(provision_context: ProvisionContext) -> Result<ProvisionContext, Infallible> {
    provision_context.prober.then(ProbeOutcome::PermissionDenied);
    Ok(provision_context)
}

#[given("bootstrapping is disabled")]
fn bootstrap_disabled(mut provision_context: ProvisionContext) -> Result<ProvisionContext, Infallible> {
    provision_context.options.do_not_bootstrap = true;
    Ok(provision_context)
}

#[when("I provision the machine")]
fn provision(provision_context: ProvisionContext) -> Result<ProvisionContext, StepError> {
    let runtime = Runtime::new()?;
    let (result, output) = runtime.block_on(provision_context.run());
    let outcome = match result {
        Ok(finished) => ProvisionResult::Finished(finished),
        Err(err) => ProvisionResult::Failed(err.to_string()),
    };

    Ok(ProvisionContext {
        outcome: Some(outcome),
        output,
        ..provision_context
    })
}

fn finished(provision_context: &ProvisionContext) -> Result<&ProvisionOutcome, StepError> {
    match &provision_context.outcome {
        Some(ProvisionResult::Finished(outcome)) => Ok(outcome),
        other => Err(StepError::Assertion(format!(
            "expected a finished run, got {other:?}"
        ))),
    }
}

#[then("the run exits with code \"{code}\"")]
fn exits_with(provision_context: &ProvisionContext, code: i32) -> Result<(), StepError> {
    let outcome = finished(provision_context)?;
    if outcome.exit_code() == code {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected exit code {code}, got {outcome:?}"
        )))
    }
}

#[then("provisioning fails mentioning \"{text}\"")]
fn fails_mentioning(provision_context: &ProvisionContext, text: String) -> Result<(), StepError> {
    match &provision_context.outcome {
        Some(ProvisionResult::Failed(message)) if message.contains(&text) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected failure mentioning '{text}', got {other:?}"
        ))),
    }
}

#[then("the rejection reads \"{text}\"")]
fn rejection_reads(provision_context: &ProvisionContext, text: String) -> Result<(), StepError> {
    match finished(provision_context)? {
        ProvisionOutcome::Rejected { message } if message.message == text => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected rejection '{text}', got {other:?}"
        ))),
    }
}

#[then("the output mentions \"{text}\"")]
fn output_mentions(provision_context: &ProvisionContext, text: String) -> Result<(), StepError> {
    if provision_context.output.contains(&text) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected output to mention '{text}', got: {}",
            provision_context.output
        )))
    }
}

#[then("the provider was refreshed \"{count}\" times")]
fn refreshed(provision_context: &ProvisionContext, count: u32) -> Result<(), StepError> {
    let actual = provision_context.provider.refresh_calls();
    if actual == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} refreshes, got {actual}"
        )))
    }
}

#[then("SSH was probed \"{count}\" times")]
fn probed(provision_context: &ProvisionContext, count: usize) -> Result<(), StepError> {
    let actual = provision_context.prober.attempts();
    if actual == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} probes, got {actual}"
        )))
    }
}

#[then("bootstrap ran once against \"{address}\" as node \"{node}\"")]
fn bootstrap_ran(
    provision_context: &ProvisionContext,
    address: String,
    node: String,
) -> Result<(), StepError> {
    let specs = provision_context.bootstrapper.specs();
    match specs.as_slice() {
        [spec] if spec.address.to_string() == address && spec.node_name == node => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected one bootstrap of {address} as {node}, got {other:?}"
        ))),
    }
}

#[then("bootstrap never ran")]
fn bootstrap_never_ran(provision_context: &ProvisionContext) -> Result<(), StepError> {
    let specs = provision_context.bootstrapper.specs();
    if specs.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no bootstrap, got {specs:?}"
        )))
    }
}
