//! Registry client port (driven/secondary port)
//!
//! This module defines the interface for interacting with the remote API
//! registry. The registry is a hierarchical resource store
//! (Project → API → Version → Spec) reachable over a request/response API.
//!
//! ## Design Notes
//!
//! - Unlike most ports, errors here are a closed enum: the use cases must
//!   tell "not found" and "already exists" apart from everything else, and
//!   must do so without knowing the adapter's transport.
//! - Uses `#[async_trait]` for async trait methods.
//! - Implementations must be safe for concurrent use from many tasks; the
//!   synchronizer shares one client across all workers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ResourceLevel, ResourceName, Style};

// ============================================================================
// RegistryError
// ============================================================================

/// Classified failure of a registry call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The named resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// A resource with the requested id already exists under the parent
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Any other failure (transport, permission, server, malformed reply)
    #[error("{0}")]
    Other(String),
}

impl RegistryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, RegistryError::AlreadyExists(_))
    }
}

// ============================================================================
// Resource / ResourceBody
// ============================================================================

/// A registry resource as returned by get, create and list calls
///
/// This is a port-level DTO. Spec contents are never returned; only their
/// metadata is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Full resource name
    pub name: ResourceName,
    /// Display name (APIs and versions)
    pub display_name: Option<String>,
    /// File name of the uploaded contents (specs only)
    pub filename: Option<String>,
    /// Style of the uploaded contents (specs only)
    pub style: Option<Style>,
    /// Size of the stored contents in bytes (specs only)
    pub size_bytes: Option<u64>,
    /// Server-side creation time, when reported
    pub create_time: Option<DateTime<Utc>>,
}

impl Resource {
    /// A resource with only its name set
    pub fn named(name: ResourceName) -> Self {
        Self {
            name,
            display_name: None,
            filename: None,
            style: None,
            size_bytes: None,
            create_time: None,
        }
    }
}

/// Body of a create request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceBody {
    Api {
        display_name: String,
    },
    Version {
        display_name: String,
    },
    /// Encoded spec contents; moved into the request and not reused
    Spec {
        filename: String,
        style: Style,
        contents: Vec<u8>,
    },
}

impl ResourceBody {
    /// The level this body creates
    pub fn level(&self) -> ResourceLevel {
        match self {
            ResourceBody::Api { .. } => ResourceLevel::Api,
            ResourceBody::Version { .. } => ResourceLevel::Version,
            ResourceBody::Spec { .. } => ResourceLevel::Spec,
        }
    }

    /// Size of the attached payload, if any
    pub fn payload_size(&self) -> Option<usize> {
        match self {
            ResourceBody::Spec { contents, .. } => Some(contents.len()),
            _ => None,
        }
    }
}

// ============================================================================
// IRegistryClient trait
// ============================================================================

/// Port trait for registry operations
///
/// ## Implementation Notes
///
/// - `get_resource` must return [`RegistryError::NotFound`] when the name
///   does not exist, and nothing else for that case.
/// - `create_resource` must return [`RegistryError::AlreadyExists`] when the
///   id is taken under `parent`, including when another caller won a race.
/// - No method retries on its own; callers favour re-running a whole,
///   idempotent synchronization.
#[async_trait::async_trait]
pub trait IRegistryClient: Send + Sync {
    /// Fetches a resource by its full name
    async fn get_resource(&self, name: &ResourceName) -> Result<Resource, RegistryError>;

    /// Creates the child `id` under `parent` with the given body
    ///
    /// The level of the created resource is taken from `body`.
    async fn create_resource(
        &self,
        parent: &ResourceName,
        id: &str,
        body: ResourceBody,
    ) -> Result<Resource, RegistryError>;

    /// Lists the children of `parent` at `level`, optionally filtered
    ///
    /// `filter` uses the registry's expression syntax,
    /// e.g. `api_id == 'payments'`.
    async fn list_resources(
        &self,
        parent: &ResourceName,
        level: ResourceLevel,
        filter: Option<&str>,
    ) -> Result<Vec<Resource>, RegistryError>;
}
