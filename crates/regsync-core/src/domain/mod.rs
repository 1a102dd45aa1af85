//! Domain types and business rules
//!
//! This module contains the core value types for regsync:
//! - Spec styles and the source kinds they accept
//! - Resource levels and typed registry resource names
//! - Path-derived resource addresses
//! - Domain-specific error types

pub mod address;
pub mod errors;
pub mod resource;
pub mod style;

// Re-export commonly used types
pub use address::ResourceAddress;
pub use errors::DomainError;
pub use resource::{ResourceLevel, ResourceName};
pub use style::{SourceKind, Style};
