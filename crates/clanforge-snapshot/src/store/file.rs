//! File-backed snapshot store
//!
//! ```text
//! <root>/
//! ├── 1234/
//! │   ├── 01J9Z3...json
//! │   └── 01J9Z4...json
//! └── 5678/
//!     └── ...
//! ```

use super::SnapshotStore;
use crate::error::SnapshotError;
use crate::model::{sort_newest_first, Snapshot, SnapshotId, SnapshotMeta};
use async_trait::async_trait;
use clanforge_graph::WorkspaceId;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Snapshot store writing one JSON file per snapshot
///
/// Writes go to a dot-prefixed temp file that is then renamed into place.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    root: PathBuf,
}

impl FileSnapshotStore {
    /// Store rooted at `root`; directories are created on first write
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding per-workspace snapshot folders
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn workspace_dir(&self, workspace: WorkspaceId) -> PathBuf {
        self.root.join(workspace.to_string())
    }

    fn snapshot_path(&self, workspace: WorkspaceId, id: SnapshotId) -> PathBuf {
        self.workspace_dir(workspace).join(format!("{id}.json"))
    }

    fn temp_path(&self, workspace: WorkspaceId, id: SnapshotId) -> PathBuf {
        self.workspace_dir(workspace).join(format!(".{id}.json.tmp"))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn put(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let dir = self.workspace_dir(snapshot.workspace_id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| SnapshotError::io(&dir, e))?;

        let path = self.snapshot_path(snapshot.workspace_id, snapshot.snapshot_id);
        if fs::try_exists(&path)
            .await
            .map_err(|e| SnapshotError::io(&path, e))?
        {
            return Err(SnapshotError::AlreadyExists(snapshot.snapshot_id));
        }

        let temp = self.temp_path(snapshot.workspace_id, snapshot.snapshot_id);
        fs::write(&temp, snapshot.to_json()?)
            .await
            .map_err(|e| SnapshotError::io(&temp, e))?;
        fs::rename(&temp, &path)
            .await
            .map_err(|e| SnapshotError::io(&path, e))?;

        tracing::debug!(path = %path.display(), "snapshot written");
        Ok(())
    }

    async fn list(&self, workspace: WorkspaceId) -> Result<Vec<SnapshotMeta>, SnapshotError> {
        let dir = self.workspace_dir(workspace);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SnapshotError::io(&dir, e)),
        };

        let mut metas = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SnapshotError::io(&dir, e))?
        {
            let path = entry.path();
            if path.extension() != Some(OsStr::new("json")) {
                continue;
            }
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'))
            {
                continue;
            }

            let json = fs::read_to_string(&path)
                .await
                .map_err(|e| SnapshotError::io(&path, e))?;
            match Snapshot::from_json(&json) {
                Ok(snapshot) => metas.push(snapshot.meta()),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable snapshot"),
            }
        }

        sort_newest_first(&mut metas);
        Ok(metas)
    }

    async fn get(&self, workspace: WorkspaceId, id: SnapshotId) -> Result<Snapshot, SnapshotError> {
        let path = self.snapshot_path(workspace, id);
        let json = match fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SnapshotError::NotFound {
                    workspace,
                    snapshot: id,
                })
            }
            Err(e) => return Err(SnapshotError::io(&path, e)),
        };
        Snapshot::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clanforge_graph::LiveGraph;
    use tempfile::TempDir;

    fn store() -> (FileSnapshotStore, TempDir) {
        let dir = TempDir::new().unwrap();
        (FileSnapshotStore::new(dir.path()), dir)
    }

    #[tokio::test]
    async fn put_and_get() {
        let (store, _dir) = store();
        let snap = Snapshot::from_graph(WorkspaceId(3), &LiveGraph::default());
        store.put(&snap).await.unwrap();

        let path = store.snapshot_path(WorkspaceId(3), snap.snapshot_id);
        assert!(path.exists());
        assert!(!store.temp_path(WorkspaceId(3), snap.snapshot_id).exists());
        assert_eq!(store.get(WorkspaceId(3), snap.snapshot_id).await.unwrap(), snap);
    }

    #[tokio::test]
    async fn never_overwrites() {
        let (store, _dir) = store();
        let snap = Snapshot::from_graph(WorkspaceId(3), &LiveGraph::default());
        store.put(&snap).await.unwrap();
        assert!(matches!(
            store.put(&snap).await.unwrap_err(),
            SnapshotError::AlreadyExists(_)
        ));
    }

    #[tokio::test]
    async fn missing_workspace_lists_empty() {
        let (store, _dir) = store();
        assert!(store.list(WorkspaceId(9)).await.unwrap().is_empty());
        let err = store
            .get(WorkspaceId(9), SnapshotId::generate())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn list_skips_temp_and_foreign_files() {
        let (store, dir) = store();
        let snap = Snapshot::from_graph(WorkspaceId(3), &LiveGraph::default());
        store.put(&snap).await.unwrap();

        let ws_dir = dir.path().join("3");
        std::fs::write(ws_dir.join(".stale.json.tmp"), "{").unwrap();
        std::fs::write(ws_dir.join("notes.txt"), "hello").unwrap();
        std::fs::write(ws_dir.join("broken.json"), "not json").unwrap();

        let metas = store.list(WorkspaceId(3)).await.unwrap();
        assert_eq!(metas.len(), 1);
        assert_eq!(metas[0].snapshot_id, snap.snapshot_id);
    }
}
