//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRegistryClient`] - Remote registry get/create/list operations

pub mod registry;

pub use registry::{IRegistryClient, RegistryError, Resource, ResourceBody};
