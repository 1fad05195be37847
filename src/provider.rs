//! Provider abstraction for creating and observing virtual machines.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::readiness::{Readiness, ReadinessState};

/// Parameters required to create a new machine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProvisionRequest {
    /// Optional display name. The provider generates one when absent.
    pub name: Option<String>,
    /// Image (dataset) identifier to boot from.
    pub image: String,
    /// Flavor (package) identifier describing the machine size.
    pub flavor: String,
}

impl ProvisionRequest {
    /// Starts a builder for a [`ProvisionRequest`].
    #[must_use]
    pub fn builder() -> ProvisionRequestBuilder {
        ProvisionRequestBuilder::new()
    }

    /// Validates the request, returning a descriptive error when a required
    /// field is missing.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::MissingField`] when the image or flavor is
    /// empty.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.image.is_empty() {
            return Err(RequestError::MissingField("image".to_owned()));
        }
        if self.flavor.is_empty() {
            return Err(RequestError::MissingField("flavor".to_owned()));
        }
        Ok(())
    }
}

/// Builder for [`ProvisionRequest`] that trims inputs and validates on build.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProvisionRequestBuilder {
    name: Option<String>,
    image: String,
    flavor: String,
}

impl ProvisionRequestBuilder {
    /// Creates an empty builder; image and flavor must be set before build.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the optional machine name.
    #[must_use]
    pub fn name(mut self, value: Option<String>) -> Self {
        self.name = value;
        self
    }

    /// Sets the image identifier.
    #[must_use]
    pub fn image(mut self, value: impl Into<String>) -> Self {
        self.image = value.into();
        self
    }

    /// Sets the flavor identifier.
    #[must_use]
    pub fn flavor(mut self, value: impl Into<String>) -> Self {
        self.flavor = value.into();
        self
    }

    /// Builds and validates the [`ProvisionRequest`].
    ///
    /// Blank names collapse to `None` so the provider picks one.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::MissingField`] when the image or flavor is
    /// empty after trimming.
    pub fn build(self) -> Result<ProvisionRequest, RequestError> {
        let request = ProvisionRequest {
            name: self
                .name
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty()),
            image: self.image.trim().to_owned(),
            flavor: self.flavor.trim().to_owned(),
        };
        request.validate()?;
        Ok(request)
    }
}

/// Errors raised while building a request.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RequestError {
    /// Raised when a required field is empty.
    #[error("missing or empty field: {0}")]
    MissingField(String),
}

/// Lifecycle state reported by the provider.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResourceState {
    /// The machine is still being built.
    Creating,
    /// The machine is running and usable.
    Ready,
    /// The provider gave up on the machine.
    Failed,
    /// Any other provider-defined state, kept verbatim.
    Other(String),
}

impl ResourceState {
    /// Maps a provider state label onto the lifecycle model.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "provisioning" => Self::Creating,
            "running" => Self::Ready,
            "failed" => Self::Failed,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns `true` once the machine is usable.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns `true` for states the machine can never leave towards ready.
    #[must_use]
    pub fn is_terminal_failure(&self) -> bool {
        match self {
            Self::Failed => true,
            Self::Other(label) => label == "deleted",
            Self::Creating | Self::Ready => false,
        }
    }

    /// Provider-facing label for the state.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Creating => "provisioning",
            Self::Ready => "running",
            Self::Failed => "failed",
            Self::Other(label) => label.as_str(),
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

/// Snapshot of a machine as reported by the provider.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProvisionedResource {
    /// Provider identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Lifecycle state at the time of the snapshot.
    pub state: ResourceState,
    /// Machine type label (for example `smartmachine`).
    pub resource_type: String,
    /// Dataset the machine was created from.
    pub dataset: String,
    /// Addresses in provider order; may be empty while the machine boots.
    pub addresses: Vec<String>,
}

impl Readiness for ProvisionedResource {
    fn readiness(&self) -> ReadinessState {
        if self.state.is_ready() {
            ReadinessState::Ready
        } else if self.state.is_terminal_failure() {
            ReadinessState::Failed
        } else {
            ReadinessState::Pending
        }
    }
}

/// Structured rejection returned by the provider when it refuses a request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProviderMessage {
    /// Machine readable error code, when the provider supplies one.
    pub code: Option<String>,
    /// Human readable explanation.
    pub message: String,
}

/// Result of a creation call that reached the provider.
///
/// Transport failures are reported through the provider's error type instead.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CreateOutcome {
    /// The provider accepted the request.
    Created(ProvisionedResource),
    /// The provider refused the request with a decodable message.
    Rejected(ProviderMessage),
}

/// Machine size offered by the provider.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Flavor {
    /// Flavor (package) name.
    pub name: String,
    /// Memory in MiB.
    pub memory: u64,
    /// Disk in MiB.
    pub disk: u64,
    /// Swap in MiB.
    pub swap: u64,
}

/// Future returned by provider operations.
pub type ProviderFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Minimal interface implemented by cloud providers.
pub trait Provider {
    /// Transport level error type returned by the provider.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Submits a creation request.
    fn create<'a>(
        &'a self,
        request: &'a ProvisionRequest,
    ) -> ProviderFuture<'a, CreateOutcome, Self::Error>;

    /// Re-reads the machine identified by `id`.
    fn refresh<'a>(&'a self, id: &'a str) -> ProviderFuture<'a, ProvisionedResource, Self::Error>;

    /// Lists the flavors available to the account.
    fn list_flavors(&self) -> ProviderFuture<'_, Vec<Flavor>, Self::Error>;
}
