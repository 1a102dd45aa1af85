//! Upload tasks and completion signals
//!
//! A [`SyncTask`] is one candidate path produced by the walker. Every task
//! that enters the worker pool leaves it as exactly one
//! [`CompletionSignal`], whatever happened to it.

use std::path::PathBuf;

use regsync_core::domain::{ResourceAddress, ResourceName, SourceKind, Style};

/// Where a task's spec goes in the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncTarget {
    /// API, Version and Spec derived from the path; all three are gated
    Hierarchy(ResourceAddress),
    /// A spec under a caller-supplied version; only the spec is gated
    Version {
        version: ResourceName,
        spec_id: String,
    },
}

/// One unit of concurrent work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTask {
    pub path: PathBuf,
    pub kind: SourceKind,
    pub style: Style,
    pub target: SyncTarget,
}

impl SyncTask {
    /// Full name of the spec this task uploads
    pub fn spec_name(&self) -> String {
        match &self.target {
            SyncTarget::Hierarchy(address) => address.spec_name().to_string(),
            SyncTarget::Version { version, spec_id } => format!("{version}/specs/{spec_id}"),
        }
    }
}

/// How a task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// At least one level was created; carries the number of levels created
    Created(u32),
    /// Everything already existed
    Unchanged,
    /// The task failed; the message carries the target and payload size
    Failed(String),
    /// The run was cancelled before the task started
    Cancelled,
}

/// Token emitted once per finished task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSignal {
    pub path: PathBuf,
    pub outcome: TaskOutcome,
}
