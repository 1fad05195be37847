//! User-facing progress output for provisioning.

use std::fmt;
use std::io::Write;

use tracing::debug;

use crate::provider::ProvisionedResource;

pub(super) const NO_BOOTSTRAP_NOTE: &str = "Not bootstrapping this node, you'll have to run a \
separate bootstrap cycle with a run_list yourself";

pub(super) const SMARTOS_NOTE: &str = "NOTE: Bootstrapping doesn't currently work on SmartOS. \
Use https://github.com/joyent/smartmachine_cookbooks on a SmartOS node after creation";

/// Writes one line of progress output.
pub(super) fn say<W: Write>(out: &mut W, args: fmt::Arguments<'_>) {
    if let Err(err) = writeln!(out, "{args}") {
        debug!(error = %err, "failed to write progress output");
    }
}

/// Writes a progress mark without a newline and flushes it.
pub(super) fn mark<W: Write>(out: &mut W, text: &str) {
    if let Err(err) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
        debug!(error = %err, "failed to write progress mark");
    }
}

fn field<W: Write>(out: &mut W, label: &str, value: &str) {
    if !value.is_empty() {
        say(out, format_args!("{label}: {value}"));
    }
}

/// Prints the machine summary, omitting empty fields.
pub(super) fn write_summary<W: Write>(out: &mut W, resource: &ProvisionedResource) {
    say(out, format_args!("Created machine:"));
    field(out, "ID", &resource.id);
    field(out, "Name", &resource.name);
    field(out, "State", resource.state.label());
    field(out, "Type", &resource.resource_type);
    field(out, "Dataset", &resource.dataset);
    field(out, "IP's", &resource.addresses.join(", "));
}
