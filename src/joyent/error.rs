//! Error types for the Joyent provider.

use thiserror::Error;

use crate::config::ConfigError;

/// Transport-level failures talking to CloudAPI.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum JoyentError {
    /// Raised when the provider configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when a request cannot be sent or its response cannot be read.
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Endpoint that was called.
        url: String,
        /// Error reported by the HTTP client.
        message: String,
    },
    /// Raised when CloudAPI answers with an error status.
    #[error("CloudAPI returned {status} for {url}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Endpoint that was called.
        url: String,
        /// Decoded error message, or the raw body when it is not JSON.
        message: String,
    },
    /// Raised when a successful response body does not match the schema.
    #[error("unexpected response from {url}: {message}")]
    Decode {
        /// Endpoint that was called.
        url: String,
        /// Deserialisation error.
        message: String,
    },
}

impl From<ConfigError> for JoyentError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}
