//! In-memory snapshot store

use super::SnapshotStore;
use crate::error::SnapshotError;
use crate::model::{sort_newest_first, Snapshot, SnapshotId, SnapshotMeta};
use async_trait::async_trait;
use clanforge_graph::WorkspaceId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Snapshot store holding serialized blobs in a [`DashMap`]
///
/// Blobs go through the same JSON encoding as the file store, so version
/// checks apply identically.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    blobs: DashMap<(WorkspaceId, SnapshotId), String>,
}

impl MemorySnapshotStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots across all workspaces
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether no snapshot is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn put(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let blob = snapshot.to_json()?;
        match self
            .blobs
            .entry((snapshot.workspace_id, snapshot.snapshot_id))
        {
            Entry::Occupied(_) => Err(SnapshotError::AlreadyExists(snapshot.snapshot_id)),
            Entry::Vacant(slot) => {
                slot.insert(blob);
                Ok(())
            }
        }
    }

    async fn list(&self, workspace: WorkspaceId) -> Result<Vec<SnapshotMeta>, SnapshotError> {
        let mut metas = Vec::new();
        for entry in self.blobs.iter().filter(|e| e.key().0 == workspace) {
            metas.push(Snapshot::from_json(entry.value())?.meta());
        }
        sort_newest_first(&mut metas);
        Ok(metas)
    }

    async fn get(&self, workspace: WorkspaceId, id: SnapshotId) -> Result<Snapshot, SnapshotError> {
        let blob = self
            .blobs
            .get(&(workspace, id))
            .map(|b| b.value().clone())
            .ok_or(SnapshotError::NotFound {
                workspace,
                snapshot: id,
            })?;
        Snapshot::from_json(&blob)
    }
}
