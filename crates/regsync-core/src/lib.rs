//! regsync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `Style`, `ResourceLevel`, `ResourceName`, `ResourceAddress`
//! - **Use cases** - `HierarchyEnsurer` (the per-level get-or-create gate)
//!   and `ListQuery` (path-to-filter translation for listings)
//! - **Port definitions** - `IRegistryClient`, the boundary to the remote registry
//! - **Configuration** - YAML-backed `Config`
//!
//! # Architecture
//!
//! The domain module contains pure value types with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate registry calls through port interfaces and never
//! inspect transport-specific status codes.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
