//! Live entities and creation requests
//!
//! Defines what the platform reports for a workspace (`Live*`), what the
//! provisioning code asks it to create (`New*`), and per-channel permission
//! overwrites.

use crate::ids::EntityId;
use crate::normalize::normalize_name;
use crate::permissions::Permissions;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Channel medium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Text channel
    Text,
    /// Voice channel
    Voice,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Text => f.write_str("text"),
            ChannelKind::Voice => f.write_str("voice"),
        }
    }
}

/// Kind of structural entity (used in reports and errors)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Channel category
    Category,
    /// Text or voice channel
    Channel,
    /// Role
    Role,
    /// Permission overwrite on a category or channel
    Overwrite,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Category => "category",
            EntityKind::Channel => "channel",
            EntityKind::Role => "role",
            EntityKind::Overwrite => "overwrite",
        };
        f.write_str(s)
    }
}

/// Subject of a permission overwrite
///
/// `Everyone` is the platform's implicit default role. It is addressed
/// symbolically so it never needs remapping across a restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "id")]
pub enum OverwriteSubject {
    /// The implicit everyone pseudo-role
    Everyone,
    /// A concrete role
    Role(EntityId),
}

impl fmt::Display for OverwriteSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverwriteSubject::Everyone => f.write_str("@everyone"),
            OverwriteSubject::Role(id) => write!(f, "role:{id}"),
        }
    }
}

/// Allow/deny pair for one subject on one category or channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Overwrite {
    /// Who the overwrite applies to
    pub subject: OverwriteSubject,
    /// Explicitly granted bits
    pub allow: Permissions,
    /// Explicitly revoked bits
    pub deny: Permissions,
}

impl Overwrite {
    /// Create overwrite
    #[inline]
    #[must_use]
    pub fn new(subject: OverwriteSubject, allow: Permissions, deny: Permissions) -> Self {
        Self {
            subject,
            allow,
            deny,
        }
    }

    /// An overwrite with neither allow nor deny bits changes nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty()
    }
}

/// A category as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveCategory {
    /// Platform id
    pub id: EntityId,
    /// Display name
    pub name: String,
    /// Sort position
    pub position: i32,
    /// Category-level overwrites
    #[serde(default)]
    pub overwrites: Vec<Overwrite>,
}

/// A channel as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveChannel {
    /// Platform id
    pub id: EntityId,
    /// Display name
    pub name: String,
    /// Text or voice
    pub kind: ChannelKind,
    /// Channel topic
    #[serde(default)]
    pub topic: Option<String>,
    /// Parent category, `None` for top-level channels
    #[serde(default)]
    pub parent: Option<EntityId>,
    /// Sort position within the parent
    pub position: i32,
    /// Channel-level overwrites
    #[serde(default)]
    pub overwrites: Vec<Overwrite>,
}

impl LiveChannel {
    /// Overwrite currently set for `subject`, if any
    #[must_use]
    pub fn overwrite_for(&self, subject: OverwriteSubject) -> Option<&Overwrite> {
        self.overwrites.iter().find(|o| o.subject == subject)
    }
}

/// A role as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveRole {
    /// Platform id
    pub id: EntityId,
    /// Display name
    pub name: String,
    /// RGB color packed as `0xRRGGBB`
    pub color: u32,
    /// Role-level permissions
    pub permissions: Permissions,
    /// Hierarchy position, higher outranks lower
    pub position: i32,
    /// Shown separately in the member list
    #[serde(default)]
    pub hoist: bool,
    /// Anyone may mention the role
    #[serde(default)]
    pub mentionable: bool,
    /// Marks the implicit everyone role; never snapshotted or matched
    #[serde(default)]
    pub is_default: bool,
}

/// Request to create a category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    /// Category name
    pub name: String,
    /// Sort position, platform default when `None`
    pub position: Option<i32>,
    /// Overwrites applied on creation
    pub overwrites: Vec<Overwrite>,
}

impl NewCategory {
    /// Category with only a name
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: None,
            overwrites: Vec::new(),
        }
    }
}

/// Request to create a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChannel {
    /// Channel name
    pub name: String,
    /// Text or voice
    pub kind: ChannelKind,
    /// Channel topic
    pub topic: Option<String>,
    /// Parent category
    pub parent: Option<EntityId>,
    /// Sort position, platform default when `None`
    pub position: Option<i32>,
}

/// Request to create a role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    /// Role name
    pub name: String,
    /// RGB color packed as `0xRRGGBB`
    pub color: u32,
    /// Role-level permissions
    pub permissions: Permissions,
    /// Shown separately in the member list
    pub hoist: bool,
    /// Anyone may mention the role
    pub mentionable: bool,
}

/// Full listing of a workspace, fetched in one walk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveGraph {
    /// Every category
    pub categories: Vec<LiveCategory>,
    /// Every channel, categorized or not
    pub channels: Vec<LiveChannel>,
    /// Every role including the everyone role
    pub roles: Vec<LiveRole>,
}

impl LiveGraph {
    /// Find a category by normalized name
    #[must_use]
    pub fn category_named(&self, name: &str) -> Option<&LiveCategory> {
        let wanted = normalize_name(name);
        self.categories
            .iter()
            .find(|c| normalize_name(&c.name) == wanted)
    }

    /// Find a role (never the default role) by normalized name
    #[must_use]
    pub fn role_named(&self, name: &str) -> Option<&LiveRole> {
        let wanted = normalize_name(name);
        self.roles
            .iter()
            .filter(|r| !r.is_default)
            .find(|r| normalize_name(&r.name) == wanted)
    }

    /// Channels parented to `category`
    pub fn channels_in(&self, category: EntityId) -> impl Iterator<Item = &LiveChannel> {
        self.channels
            .iter()
            .filter(move |c| c.parent == Some(category))
    }

    /// Whether any category, channel or role carries `id`
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.categories.iter().any(|c| c.id == id)
            || self.channels.iter().any(|c| c.id == id)
            || self.roles.iter().any(|r| r.id == id)
    }

    /// Total number of structural entities, excluding the default role
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.categories.len()
            + self.channels.len()
            + self.roles.iter().filter(|r| !r.is_default).count()
    }

    /// References that do not resolve inside this graph
    ///
    /// Reports channel parents that are not categories and overwrite subjects
    /// that are not roles. An empty result means the graph is referentially
    /// intact.
    #[must_use]
    pub fn dangling_references(&self) -> Vec<(EntityId, EntityId)> {
        let mut dangling = Vec::new();
        let role_exists = |id: EntityId| self.roles.iter().any(|r| r.id == id);
        let overwrites = self
            .categories
            .iter()
            .map(|c| (c.id, &c.overwrites))
            .chain(self.channels.iter().map(|c| (c.id, &c.overwrites)));
        for (owner, list) in overwrites {
            for ow in list {
                if let OverwriteSubject::Role(role) = ow.subject {
                    if !role_exists(role) {
                        dangling.push((owner, role));
                    }
                }
            }
        }
        for channel in &self.channels {
            if let Some(parent) = channel.parent {
                if !self.categories.iter().any(|c| c.id == parent) {
                    dangling.push((channel.id, parent));
                }
            }
        }
        dangling
    }
}
