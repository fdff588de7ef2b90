//! clanforge snapshot - capture, store and restore workspace graphs
//!
//! - [`capture`] copies the live graph into an immutable [`Snapshot`]
//! - [`SnapshotStore`] persists snapshots append-only, keyed by workspace
//!   and [`SnapshotId`] ([`MemorySnapshotStore`], [`FileSnapshotStore`])
//! - [`RestoreEngine`] recreates missing entities and remaps every
//!   reference through an old -> new id map
//!
//! # Example
//!
//! ```rust,ignore
//! use clanforge_snapshot::{capture, FileSnapshotStore, RestoreEngine, SnapshotStore};
//!
//! let store = FileSnapshotStore::new("snapshots");
//! let snapshot = capture(&platform, workspace).await?;
//! store.put(&snapshot).await?;
//!
//! let loaded = store.get(workspace, snapshot.snapshot_id).await?;
//! let report = RestoreEngine::new(&platform, &throttle)
//!     .restore(workspace, &loaded)
//!     .await?;
//! ```

#![warn(unreachable_pub)]

pub mod capture;
pub mod error;
pub mod model;
pub mod restore;
pub mod store;

pub use capture::capture;
pub use error::SnapshotError;
pub use model::{
    CategoryRecord, ChannelRecord, OverwriteRecord, RoleRecord, Snapshot, SnapshotId,
    SnapshotMeta, CURRENT_FORMAT_VERSION,
};
pub use restore::{RestoreEngine, RestoreReport, UnmappedSubjectPolicy};
pub use store::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
