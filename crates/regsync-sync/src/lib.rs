//! regsync Sync - Concurrent spec upload synchronizer
//!
//! Provides:
//! - Content encoding (gzip for single files, zip for directory trees)
//! - Tree and glob traversal into upload tasks
//! - A bounded worker pool that drives the hierarchy ensure per task
//!
//! ## Modules
//!
//! - [`encoder`] - Gzip compression and zip archive assembly
//! - [`task`] - Upload tasks and their completion signals
//! - [`walker`] - Candidate discovery (directory walk or glob expansion)
//! - [`synchronizer`] - Worker pool, fan-out and fan-in

pub mod encoder;
pub mod synchronizer;
pub mod task;
pub mod walker;

use thiserror::Error;

pub use encoder::EncodingError;
pub use synchronizer::{SyncReport, Synchronizer};
pub use task::{CompletionSignal, SyncTarget, SyncTask, TaskOutcome};
pub use walker::{WalkStats, Walker};

/// Errors that abort a whole run
///
/// Failures of individual tasks never surface here; they are counted in the
/// [`SyncReport`].
#[derive(Debug, Error)]
pub enum SyncError {
    /// The discovery thread panicked or was aborted
    #[error("Traversal failed: {0}")]
    Traversal(String),

    /// A domain-level error propagated from regsync-core
    #[error("Domain error: {0}")]
    Domain(#[from] regsync_core::domain::DomainError),
}
