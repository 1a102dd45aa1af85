//! regsync Registry - API registry adapters
//!
//! Provides:
//! - A REST/JSON client for the registry's HTTP surface
//! - An [`IRegistryClient`](regsync_core::ports::IRegistryClient) adapter
//!   over that client
//! - An in-memory registry used for dry runs and tests
//!
//! ## Modules
//!
//! - [`client`] - Typed HTTP client (reqwest)
//! - [`provider`] - Port adapter that classifies HTTP failures
//! - [`memory`] - In-process registry with call counters and failure injection

pub mod client;
pub mod memory;
pub mod provider;

use regsync_core::ports::RegistryError;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

pub use client::RegistryClient;
pub use memory::InMemoryRegistry;
pub use provider::RegistryProvider;

/// Errors that can occur when talking to the registry over HTTP
#[derive(Debug, Error)]
pub enum RegistryHttpError {
    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The resource id is already taken under its parent
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Credentials are missing, invalid or insufficient
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A request URL could not be built
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Error payload returned by the registry's REST transcoding
///
/// Both the wrapped (`{"error": {...}}`) and the flat gRPC-gateway shapes
/// are accepted.
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorStatus>,
    #[serde(flatten)]
    flat: ErrorStatus,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorStatus {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl RegistryHttpError {
    /// Classifies a non-success response.
    ///
    /// A `status` token in the JSON body (`NOT_FOUND`, `ALREADY_EXISTS`)
    /// takes precedence over the HTTP status code.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
        let detail = envelope.error.unwrap_or(envelope.flat);
        let message = detail
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string()
            });

        match detail.status.as_deref() {
            Some("NOT_FOUND") => return RegistryHttpError::NotFound(message),
            Some("ALREADY_EXISTS") => return RegistryHttpError::AlreadyExists(message),
            _ => {}
        }

        match status {
            StatusCode::NOT_FOUND => RegistryHttpError::NotFound(message),
            StatusCode::CONFLICT => RegistryHttpError::AlreadyExists(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                RegistryHttpError::Unauthorized(message)
            }
            _ => RegistryHttpError::Status {
                status: status.as_u16(),
                message,
            },
        }
    }
}

impl From<RegistryHttpError> for RegistryError {
    fn from(err: RegistryHttpError) -> Self {
        match err {
            RegistryHttpError::NotFound(message) => RegistryError::NotFound(message),
            RegistryHttpError::AlreadyExists(message) => RegistryError::AlreadyExists(message),
            other => RegistryError::Other(other.to_string()),
        }
    }
}
