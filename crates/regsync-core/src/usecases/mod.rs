//! Use cases (application services)
//!
//! Use cases orchestrate registry calls through port interfaces.
//!
//! ## Use Cases
//!
//! - [`HierarchyEnsurer`] - Idempotent get-or-create of API, Version and Spec
//! - [`ListQuery`] - Translates a name pattern into a filtered listing

pub mod ensure;
pub mod list;

pub use ensure::{
    BoxError, EnsureError, GateOutcome, HierarchyEnsurer, HierarchyOutcome, RemoteOp,
};
pub use list::ListQuery;
