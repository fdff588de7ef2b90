//! Snapshot errors

use crate::model::SnapshotId;
use clanforge_graph::{PlatformError, WorkspaceId};
use std::path::PathBuf;

/// Snapshot capture, storage and restore errors
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// No snapshot with this id for the workspace
    #[error("snapshot {snapshot} not found for workspace {workspace}")]
    NotFound {
        workspace: WorkspaceId,
        snapshot: SnapshotId,
    },

    /// Snapshot ids are never reused
    #[error("snapshot {0} already exists")]
    AlreadyExists(SnapshotId),

    /// Restore target differs from the snapshot's workspace
    #[error("snapshot belongs to workspace {snapshot}, refusing to restore into {requested}")]
    WorkspaceMismatch {
        requested: WorkspaceId,
        snapshot: WorkspaceId,
    },

    /// Blob written by a newer format
    #[error("unsupported snapshot format version {found} (supported up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Live graph could not be read
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Filesystem failure
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Blob is not a snapshot
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SnapshotError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the requested snapshot does not exist
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
