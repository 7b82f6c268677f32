//! shotty cloud core
//!
//! Provider abstraction plus the orchestration that sits on top of it:
//! resolving a project filter into instances, checking volumes for in-flight
//! snapshots, listing instance → volume → snapshot state, and driving the
//! stop → snapshot → start cycle.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   shotty CLI                     │
//! │     (instances / volumes / snapshots ...)        │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                shotty-cloud                      │
//! │  ┌──────────┐ ┌───────────┐ ┌───────────────┐   │
//! │  │  filter  │ │  listing  │ │   lifecycle   │   │
//! │  └──────────┘ └───────────┘ └───────┬───────┘   │
//! │                               ┌─────▼─────┐     │
//! │                               │ inspector │     │
//! │                               └───────────┘     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  trait ComputeProvider { ... }           │   │
//! │  └──────────────────────────────────────────┘   │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │ aws (ec2/ebs) │
//! └───────────────┘
//! ```

pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod fake;
pub mod filter;
pub mod inspector;
pub mod lifecycle;
pub mod listing;
pub mod model;
pub mod provider;

// Re-exports
pub use error::{CloudError, Result};
pub use filter::filter_instances;
pub use inspector::has_pending_snapshot;
pub use lifecycle::{
    BatchReport, DEFAULT_SNAPSHOT_DESCRIPTION, FailureKind, InstanceFailure, InstanceReport,
    LifecycleEvent, LifecycleOptions, LifecyclePhase, Orchestrator, Outcome,
};
pub use listing::{InstanceRecord, SnapshotListing, SnapshotRecord, VolumeRecord};
pub use model::{
    Instance, InstanceState, ProjectFilter, Snapshot, SnapshotState, Tags, Volume, VolumeState,
};
pub use provider::{ComputeProvider, Page, ResourceStream, paginate};
