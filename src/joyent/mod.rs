//! Joyent CloudAPI provider.
//!
//! Talks to the `/my/machines` and `/my/packages` endpoints with basic
//! authentication. Create rejections that carry a decodable CloudAPI error
//! body become [`CreateOutcome::Rejected`]; everything else that goes wrong
//! on the wire surfaces as a [`JoyentError`].

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::JoyentConfig;
use crate::provider::{
    CreateOutcome, Flavor, Provider, ProviderFuture, ProviderMessage, ProvisionRequest,
    ProvisionedResource,
};

mod error;
mod types;

pub use error::JoyentError;

use types::{CreateMachineRequest, ErrorBody, Machine, Package};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const API_VERSION_HEADER: &str = "X-Api-Version";

/// Provider backed by the Joyent CloudAPI.
#[derive(Clone, Debug)]
pub struct JoyentProvider {
    client: reqwest::Client,
    config: JoyentConfig,
}

impl JoyentProvider {
    /// Builds a provider after validating credentials.
    ///
    /// # Errors
    ///
    /// Returns [`JoyentError::Config`] when the username or password is
    /// missing, or [`JoyentError::Transport`] when the HTTP client cannot be
    /// constructed.
    pub fn new(config: JoyentConfig) -> Result<Self, JoyentError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| JoyentError::Transport {
                url: config.base_url().to_owned(),
                message: err.to_string(),
            })?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/my/{path}", self.config.base_url())
    }

    fn authorised(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, JoyentError> {
        let (username, password) = self.config.credentials()?;
        Ok(builder
            .basic_auth(username, Some(password))
            .header(API_VERSION_HEADER, &self.config.api_version)
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    async fn send(
        &self,
        url: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<(u16, Vec<u8>), JoyentError> {
        let transport = |err: reqwest::Error| JoyentError::Transport {
            url: url.to_owned(),
            message: err.to_string(),
        };
        let response = self.authorised(builder)?.send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport)?;
        debug!(url, status, bytes = body.len(), "CloudAPI response");
        Ok((status, body.to_vec()))
    }

    async fn create_machine(
        &self,
        request: &ProvisionRequest,
    ) -> Result<CreateOutcome, JoyentError> {
        let url = self.endpoint("machines");
        let payload = CreateMachineRequest::from(request);
        let (status, body) = self.send(&url, self.client.post(&url).json(&payload)).await?;
        decode_create(status, &url, &body)
    }

    async fn get_machine(&self, id: &str) -> Result<ProvisionedResource, JoyentError> {
        let url = self.endpoint(&format!("machines/{id}"));
        let (status, body) = self.send(&url, self.client.get(&url)).await?;
        decode_success::<Machine>(status, &url, &body).map(ProvisionedResource::from)
    }

    async fn list_packages(&self) -> Result<Vec<Flavor>, JoyentError> {
        let url = self.endpoint("packages");
        let (status, body) = self.send(&url, self.client.get(&url)).await?;
        let packages = decode_success::<Vec<Package>>(status, &url, &body)?;
        Ok(packages.into_iter().map(Flavor::from).collect())
    }
}

impl Provider for JoyentProvider {
    type Error = JoyentError;

    fn create<'a>(
        &'a self,
        request: &'a ProvisionRequest,
    ) -> ProviderFuture<'a, CreateOutcome, Self::Error> {
        Box::pin(self.create_machine(request))
    }

    fn refresh<'a>(&'a self, id: &'a str) -> ProviderFuture<'a, ProvisionedResource, Self::Error> {
        Box::pin(self.get_machine(id))
    }

    fn list_flavors(&self) -> ProviderFuture<'_, Vec<Flavor>, Self::Error> {
        Box::pin(self.list_packages())
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn api_error(status: u16, url: &str, body: &[u8]) -> JoyentError {
    let message = serde_json::from_slice::<ErrorBody>(body).map_or_else(
        |_| String::from_utf8_lossy(body).into_owned(),
        |decoded| ProviderMessage::from(decoded).message,
    );
    JoyentError::Api {
        status,
        url: url.to_owned(),
        message,
    }
}

fn decode_success<T: DeserializeOwned>(
    status: u16,
    url: &str,
    body: &[u8],
) -> Result<T, JoyentError> {
    if !is_success(status) {
        return Err(api_error(status, url, body));
    }
    serde_json::from_slice(body).map_err(|err| JoyentError::Decode {
        url: url.to_owned(),
        message: err.to_string(),
    })
}

/// Maps a create response into an outcome.
///
/// A non-success status whose body decodes as a CloudAPI error becomes a
/// rejection; an undecodable error body stays a transport-level failure.
fn decode_create(status: u16, url: &str, body: &[u8]) -> Result<CreateOutcome, JoyentError> {
    if is_success(status) {
        return decode_success::<Machine>(status, url, body)
            .map(|machine| CreateOutcome::Created(machine.into()));
    }
    serde_json::from_slice::<ErrorBody>(body).map_or_else(
        |_| Err(api_error(status, url, body)),
        |decoded| Ok(CreateOutcome::Rejected(decoded.into())),
    )
}
