//! Domain error types
//!
//! This module defines error types specific to domain operations:
//! path-to-address derivation, style validation and resource naming.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A path could not be mapped onto an API/Version/Spec address
    #[error("Malformed path: {0}")]
    MalformedPath(String),

    /// A style token is unknown, or does not match the source kind
    #[error("Unsupported style {style} for {source_kind}")]
    UnsupportedStyle {
        /// The offending style token
        style: String,
        /// What the style was paired with (`file`, `directory`, `token`)
        source_kind: String,
    },

    /// A registry resource name does not follow the collection/id layout
    #[error("Invalid resource name: {0}")]
    InvalidName(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
