//! CloudAPI wire representations.

use serde::{Deserialize, Serialize};

use crate::provider::{Flavor, ProviderMessage, ProvisionRequest, ProvisionedResource, ResourceState};

#[derive(Debug, Serialize)]
pub(super) struct CreateMachineRequest<'a> {
    dataset: &'a str,
    package: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl<'a> From<&'a ProvisionRequest> for CreateMachineRequest<'a> {
    fn from(request: &'a ProvisionRequest) -> Self {
        Self {
            dataset: &request.image,
            package: &request.flavor,
            name: request.name.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct Machine {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    state: String,
    #[serde(default, rename = "type")]
    machine_type: String,
    #[serde(default, alias = "image")]
    dataset: String,
    #[serde(default)]
    ips: Vec<String>,
}

impl From<Machine> for ProvisionedResource {
    fn from(machine: Machine) -> Self {
        Self {
            id: machine.id,
            name: machine.name,
            state: ResourceState::from_label(&machine.state),
            resource_type: machine.machine_type,
            dataset: machine.dataset,
            addresses: machine.ips,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct Package {
    name: String,
    #[serde(default)]
    memory: u64,
    #[serde(default)]
    disk: u64,
    #[serde(default)]
    swap: u64,
}

impl From<Package> for Flavor {
    fn from(package: Package) -> Self {
        Self {
            name: package.name,
            memory: package.memory,
            disk: package.disk,
            swap: package.swap,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

impl From<ErrorBody> for ProviderMessage {
    fn from(body: ErrorBody) -> Self {
        Self {
            code: body.code,
            message: body.message,
        }
    }
}
