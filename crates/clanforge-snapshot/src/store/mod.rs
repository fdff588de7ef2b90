//! Snapshot persistence
//!
//! A [`SnapshotStore`] is append-only: `put` refuses to replace an existing
//! snapshot, and nothing is ever deleted through it. Snapshots are keyed
//! by `(workspace, snapshot id)`.

mod file;
mod memory;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;

use crate::error::SnapshotError;
use crate::model::{Snapshot, SnapshotId, SnapshotMeta};
use async_trait::async_trait;
use clanforge_graph::WorkspaceId;

/// Durable snapshot storage
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist a new snapshot
    ///
    /// # Errors
    /// `AlreadyExists` if the id is taken, or a storage failure.
    async fn put(&self, snapshot: &Snapshot) -> Result<(), SnapshotError>;

    /// Metadata of every snapshot of a workspace, newest first
    async fn list(&self, workspace: WorkspaceId) -> Result<Vec<SnapshotMeta>, SnapshotError>;

    /// Load one snapshot
    ///
    /// # Errors
    /// `NotFound` if the workspace has no snapshot with this id.
    async fn get(&self, workspace: WorkspaceId, id: SnapshotId) -> Result<Snapshot, SnapshotError>;
}
