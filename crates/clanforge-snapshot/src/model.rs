//! Snapshot data model
//!
//! A snapshot is an immutable copy of a workspace's categories, channels
//! and roles. Permission bits are stored as raw 64-bit vectors so bits the
//! current build does not name survive a round trip. Every blob carries a
//! `format_version`; blobs written before versioning read as version 0.

use crate::error::SnapshotError;
use chrono::{DateTime, Utc};
use clanforge_graph::{
    ChannelKind, EntityId, LiveCategory, LiveChannel, LiveGraph, LiveRole, Overwrite,
    OverwriteSubject, Permissions, WorkspaceId,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Format version written by this build
pub const CURRENT_FORMAT_VERSION: u32 = 1;

/// Snapshot identifier (ULID, sortable by creation time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(pub Ulid);

impl SnapshotId {
    /// Generate a fresh id
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SnapshotId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s).map(Self)
    }
}

/// Stored permission overwrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverwriteRecord {
    /// Role or member
    pub subject: OverwriteSubject,
    /// Allowed permission bits
    pub allow: u64,
    /// Denied permission bits
    pub deny: u64,
}

impl OverwriteRecord {
    /// Overwrite with `subject` replaced
    #[must_use]
    pub fn to_overwrite(&self, subject: OverwriteSubject) -> Overwrite {
        Overwrite::new(
            subject,
            Permissions::from_bits_retain(self.allow),
            Permissions::from_bits_retain(self.deny),
        )
    }
}

impl From<&Overwrite> for OverwriteRecord {
    fn from(o: &Overwrite) -> Self {
        Self {
            subject: o.subject,
            allow: o.allow.bits(),
            deny: o.deny.bits(),
        }
    }
}

/// Stored category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    /// Id at capture time
    pub id: EntityId,
    /// Display name
    pub name: String,
    /// Sort position
    pub position: i32,
    /// Category-level overwrites
    #[serde(default)]
    pub overwrites: Vec<OverwriteRecord>,
}

impl From<&LiveCategory> for CategoryRecord {
    fn from(c: &LiveCategory) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            position: c.position,
            overwrites: c.overwrites.iter().map(OverwriteRecord::from).collect(),
        }
    }
}

/// Stored channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// Id at capture time
    pub id: EntityId,
    /// Display name
    pub name: String,
    /// Text or voice
    pub kind: ChannelKind,
    /// Channel topic
    #[serde(default)]
    pub topic: Option<String>,
    /// Parent category id at capture time
    #[serde(default)]
    pub parent: Option<EntityId>,
    /// Sort position within the parent
    pub position: i32,
    /// Channel-level overwrites
    #[serde(default)]
    pub overwrites: Vec<OverwriteRecord>,
}

impl From<&LiveChannel> for ChannelRecord {
    fn from(c: &LiveChannel) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            kind: c.kind,
            topic: c.topic.clone(),
            parent: c.parent,
            position: c.position,
            overwrites: c.overwrites.iter().map(OverwriteRecord::from).collect(),
        }
    }
}

/// Stored role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    /// Id at capture time
    pub id: EntityId,
    /// Display name
    pub name: String,
    /// RGB color packed as `0xRRGGBB`
    pub color: u32,
    /// Permission bits
    pub permissions: u64,
    /// Hierarchy position
    pub position: i32,
    /// Shown separately in the member list
    #[serde(default)]
    pub hoist: bool,
    /// Anyone may mention the role
    #[serde(default)]
    pub mentionable: bool,
}

impl From<&LiveRole> for RoleRecord {
    fn from(r: &LiveRole) -> Self {
        Self {
            id: r.id,
            name: r.name.clone(),
            color: r.color,
            permissions: r.permissions.bits(),
            position: r.position,
            hoist: r.hoist,
            mentionable: r.mentionable,
        }
    }
}

/// Point-in-time copy of a workspace graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Missing in blobs written before versioning
    #[serde(default)]
    pub format_version: u32,
    /// Unique, time ordered
    pub snapshot_id: SnapshotId,
    /// Workspace captured
    pub workspace_id: WorkspaceId,
    /// Capture time
    pub created_at: DateTime<Utc>,
    /// Every category
    pub categories: Vec<CategoryRecord>,
    /// Every channel
    pub channels: Vec<ChannelRecord>,
    /// Every role except the implicit everyone role
    pub roles: Vec<RoleRecord>,
}

impl Snapshot {
    /// Copy a live graph under a fresh id
    #[must_use]
    pub fn from_graph(workspace_id: WorkspaceId, graph: &LiveGraph) -> Self {
        Self {
            format_version: CURRENT_FORMAT_VERSION,
            snapshot_id: SnapshotId::generate(),
            workspace_id,
            created_at: Utc::now(),
            categories: graph.categories.iter().map(CategoryRecord::from).collect(),
            channels: graph.channels.iter().map(ChannelRecord::from).collect(),
            roles: graph
                .roles
                .iter()
                .filter(|r| !r.is_default)
                .map(RoleRecord::from)
                .collect(),
        }
    }

    /// Listing metadata
    #[must_use]
    pub fn meta(&self) -> SnapshotMeta {
        SnapshotMeta {
            snapshot_id: self.snapshot_id,
            workspace_id: self.workspace_id,
            created_at: self.created_at,
            format_version: self.format_version,
            role_count: self.roles.len(),
            category_count: self.categories.len(),
            channel_count: self.channels.len(),
        }
    }

    /// Serialize to a pretty JSON blob
    ///
    /// # Errors
    /// Serialization failure.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a JSON blob, rejecting formats newer than this build
    ///
    /// # Errors
    /// `Serialization` for malformed blobs, `UnsupportedVersion` for newer ones.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.format_version > CURRENT_FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.format_version,
                supported: CURRENT_FORMAT_VERSION,
            });
        }
        Ok(snapshot)
    }

    /// Total stored entities
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.categories.len() + self.channels.len() + self.roles.len()
    }
}

/// Lightweight listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Snapshot this entry describes
    pub snapshot_id: SnapshotId,
    /// Workspace captured
    pub workspace_id: WorkspaceId,
    /// Capture time
    pub created_at: DateTime<Utc>,
    /// Blob format version
    pub format_version: u32,
    /// Roles stored
    pub role_count: usize,
    /// Categories stored
    pub category_count: usize,
    /// Channels stored
    pub channel_count: usize,
}

/// Sort newest first; ids break timestamp ties
pub(crate) fn sort_newest_first(metas: &mut [SnapshotMeta]) {
    metas.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.snapshot_id.cmp(&a.snapshot_id))
    });
}
