//! BDD scenarios for the provisioning workflow.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ProvisionContext, provision_context};

#[scenario(
    path = "tests/features/provision.feature",
    name = "Bootstrap a machine on its public address"
)]
fn scenario_bootstrap_public_address(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Retry refused SSH connections until sshd answers"
)]
fn scenario_retry_refused_ssh(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Skip bootstrap when asked to"
)]
fn scenario_skip_bootstrap(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Report a structured provider rejection"
)]
fn scenario_report_rejection(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Fail fast when the machine has no public address"
)]
fn scenario_no_public_address(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Treat permission denied probes as fatal"
)]
fn scenario_permission_denied(provision_context: ProvisionContext) {
    drop(provision_context);
}
