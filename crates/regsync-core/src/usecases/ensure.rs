//! Hierarchy ensure use case
//!
//! Makes sure an API, Version and Spec exist in the registry, creating only
//! what is missing. Every level goes through the same gate:
//!
//! ```text
//! get(name) ── ok ──────────────→ Found        (no mutation)
//!     │
//!     ├─ NotFound → build body → create ── ok ─────────→ Created
//!     │                              ├─ AlreadyExists → Raced
//!     │                              └─ other ────────→ Err(Remote)
//!     └─ other ───────────────────→ Err(Remote)  (never create blindly)
//! ```
//!
//! A second run over an unchanged tree therefore issues only gets. The spec
//! payload is built lazily, after the spec is known to be missing, so files
//! that are already uploaded are never read or compressed.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{DomainError, ResourceAddress, ResourceLevel, ResourceName};
use crate::ports::{IRegistryClient, RegistryError, ResourceBody};

/// Error type produced by payload builders
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ============================================================================
// Outcomes and errors
// ============================================================================

/// Result of gating a single level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// The resource was missing and this call created it
    Created,
    /// The existence check found the resource
    Found,
    /// The resource was missing but another caller created it first
    Raced,
}

impl GateOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, GateOutcome::Created)
    }
}

/// Per-level outcomes of a full hierarchy ensure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchyOutcome {
    pub api: GateOutcome,
    pub version: GateOutcome,
    pub spec: GateOutcome,
}

impl HierarchyOutcome {
    /// Number of levels this call created
    pub fn created_count(&self) -> u32 {
        [self.api, self.version, self.spec]
            .iter()
            .filter(|outcome| outcome.is_created())
            .count() as u32
    }
}

/// The remote operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    Get,
    Create,
}

impl std::fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteOp::Get => write!(f, "get"),
            RemoteOp::Create => write!(f, "create"),
        }
    }
}

/// Errors that abort an ensure chain
#[derive(Debug, Error)]
pub enum EnsureError {
    /// A registry call failed with something other than the expected
    /// NotFound / AlreadyExists
    #[error("failed to {op} {level} {name}: {source}{}", size_suffix(.payload_size))]
    Remote {
        level: ResourceLevel,
        op: RemoteOp,
        name: String,
        /// Size of the payload that was being uploaded, if any
        payload_size: Option<usize>,
        #[source]
        source: RegistryError,
    },

    /// The create body could not be built (read or encoding failure)
    #[error("failed to prepare contents for {name}: {source}")]
    Payload {
        name: String,
        #[source]
        source: BoxError,
    },

    /// A name or body did not fit the hierarchy
    #[error(transparent)]
    Domain(#[from] DomainError),
}

fn size_suffix(payload_size: &Option<usize>) -> String {
    payload_size
        .map(|size| format!(" [contents-length: {size}]"))
        .unwrap_or_default()
}

impl EnsureError {
    /// The level the chain stopped at, when the failure was remote
    pub fn level(&self) -> Option<ResourceLevel> {
        match self {
            EnsureError::Remote { level, .. } => Some(*level),
            _ => None,
        }
    }
}

// ============================================================================
// HierarchyEnsurer
// ============================================================================

/// Use case that gates registry resources level by level
#[derive(Clone)]
pub struct HierarchyEnsurer {
    client: Arc<dyn IRegistryClient>,
}

impl HierarchyEnsurer {
    /// Creates a new ensurer over a shared registry client
    pub fn new(client: Arc<dyn IRegistryClient>) -> Self {
        Self { client }
    }

    /// Ensures `parent/{level}/{id}` exists.
    ///
    /// `make_body` is only awaited when the resource is missing. The body it
    /// returns must be for `level`.
    pub async fn ensure<F, Fut>(
        &self,
        parent: &ResourceName,
        level: ResourceLevel,
        id: &str,
        make_body: F,
    ) -> Result<GateOutcome, EnsureError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<ResourceBody, BoxError>> + Send,
    {
        let name = parent.child(level, id)?;

        match self.client.get_resource(&name).await {
            Ok(_) => {
                debug!(name = %name, "Found");
                return Ok(GateOutcome::Found);
            }
            Err(RegistryError::NotFound(_)) => {}
            Err(source) => {
                return Err(EnsureError::Remote {
                    level,
                    op: RemoteOp::Get,
                    name: name.to_string(),
                    payload_size: None,
                    source,
                });
            }
        }

        let body = make_body().await.map_err(|source| EnsureError::Payload {
            name: name.to_string(),
            source,
        })?;
        if body.level() != level {
            return Err(DomainError::ValidationFailed(format!(
                "{} body supplied for {} {}",
                body.level(),
                level,
                name
            ))
            .into());
        }
        let payload_size = body.payload_size();

        match self.client.create_resource(parent, id, body).await {
            Ok(resource) => {
                info!(name = %resource.name, size = ?payload_size, "Created");
                Ok(GateOutcome::Created)
            }
            Err(RegistryError::AlreadyExists(_)) => {
                debug!(name = %name, "Created concurrently by another task");
                Ok(GateOutcome::Raced)
            }
            Err(source) => Err(EnsureError::Remote {
                level,
                op: RemoteOp::Create,
                name: name.to_string(),
                payload_size,
                source,
            }),
        }
    }

    /// Ensures the API, the Version and then the Spec of `address`.
    ///
    /// Stops at the first failing level; descendants of a failed level are
    /// never requested.
    pub async fn ensure_hierarchy<F, Fut>(
        &self,
        address: &ResourceAddress,
        make_spec_body: F,
    ) -> Result<HierarchyOutcome, EnsureError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<ResourceBody, BoxError>> + Send,
    {
        let project = ResourceName::project(address.project_id())?;

        let api = self
            .ensure(&project, ResourceLevel::Api, address.api_id(), || {
                std::future::ready(Ok(ResourceBody::Api {
                    display_name: address.api_display_name().to_string(),
                }))
            })
            .await?;

        let version = self
            .ensure(
                address.api_name(),
                ResourceLevel::Version,
                address.version_id(),
                || {
                    std::future::ready(Ok(ResourceBody::Version {
                        display_name: address.version_id().to_string(),
                    }))
                },
            )
            .await?;

        let spec = self
            .ensure_spec(address.version_name(), address.spec_id(), make_spec_body)
            .await?;

        Ok(HierarchyOutcome { api, version, spec })
    }

    /// Ensures only the Spec level under an existing version.
    pub async fn ensure_spec<F, Fut>(
        &self,
        version: &ResourceName,
        spec_id: &str,
        make_body: F,
    ) -> Result<GateOutcome, EnsureError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<ResourceBody, BoxError>> + Send,
    {
        self.ensure(version, ResourceLevel::Spec, spec_id, make_body)
            .await
    }
}

// ============================================================================
// Unit tests
// ============================================================================
