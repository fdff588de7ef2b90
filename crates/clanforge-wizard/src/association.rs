//! Workspace to clan association
//!
//! One [`ClanLink`] per workspace: the linked clan tag, which channel each
//! feature posts to, and the notification toggles. The durable store lives
//! outside this crate; [`MemoryAssociationStore`] backs tests and the CLI.

use crate::selections::Feature;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clanforge_graph::{EntityId, UserId, WorkspaceId};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Channel a feature posts to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureBinding {
    /// Bound feature
    pub feature: Feature,
    /// Channel the feature posts to
    pub channel: EntityId,
    /// Channel name at binding time
    pub channel_name: String,
}

/// Linked clan record of a workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClanLink {
    /// Linked workspace
    pub workspace_id: WorkspaceId,
    /// Clan tag, uppercase with leading `#`
    pub clan_tag: String,
    /// Feature bindings, one per feature
    pub bindings: Vec<FeatureBinding>,
    /// Notification switch per feature
    pub notifications: BTreeMap<Feature, bool>,
    /// User who linked last
    pub linked_by: UserId,
    /// Time of the last link
    pub linked_at: DateTime<Utc>,
}

impl ClanLink {
    /// Binding for `feature`, if any
    #[must_use]
    pub fn binding(&self, feature: Feature) -> Option<&FeatureBinding> {
        self.bindings.iter().find(|b| b.feature == feature)
    }

    /// Keep `previous` bindings and toggles for features this link does not set
    ///
    /// Only applied when both records link the same clan.
    pub fn merge_previous(&mut self, previous: &ClanLink) {
        if previous.clan_tag != self.clan_tag {
            return;
        }
        for binding in &previous.bindings {
            if self.binding(binding.feature).is_none() {
                self.bindings.push(binding.clone());
            }
        }
        for (feature, on) in &previous.notifications {
            self.notifications.entry(*feature).or_insert(*on);
        }
        self.bindings.sort_by_key(|b| b.feature);
    }
}

/// Association store failure
#[derive(Debug, thiserror::Error)]
pub enum AssociationError {
    /// Backend could not be reached
    #[error("association store unavailable: {0}")]
    Unavailable(String),
}

/// Read/write access to linked clan records
#[async_trait]
pub trait ClanAssociationStore: Send + Sync {
    /// Record of `workspace`, if linked
    async fn get(&self, workspace: WorkspaceId) -> Result<Option<ClanLink>, AssociationError>;

    /// Replace the workspace's record
    async fn put(&self, link: ClanLink) -> Result<(), AssociationError>;
}

/// In-memory association store
#[derive(Debug, Default)]
pub struct MemoryAssociationStore {
    links: DashMap<WorkspaceId, ClanLink>,
    unavailable: AtomicBool,
}

impl MemoryAssociationStore {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    fn check(&self) -> Result<(), AssociationError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(AssociationError::Unavailable("store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ClanAssociationStore for MemoryAssociationStore {
    async fn get(&self, workspace: WorkspaceId) -> Result<Option<ClanLink>, AssociationError> {
        self.check()?;
        Ok(self.links.get(&workspace).map(|l| l.clone()))
    }

    async fn put(&self, link: ClanLink) -> Result<(), AssociationError> {
        self.check()?;
        self.links.insert(link.workspace_id, link);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(tag: &str, bindings: &[(Feature, u64)]) -> ClanLink {
        ClanLink {
            workspace_id: WorkspaceId(1),
            clan_tag: tag.to_string(),
            bindings: bindings
                .iter()
                .map(|(feature, id)| FeatureBinding {
                    feature: *feature,
                    channel: EntityId(*id),
                    channel_name: feature.key().to_string(),
                })
                .collect(),
            notifications: bindings.iter().map(|(f, _)| (*f, true)).collect(),
            linked_by: UserId(9),
            linked_at: Utc::now(),
        }
    }

    #[test]
    fn merge_keeps_unrelated_bindings() {
        let previous = link("#2PP", &[(Feature::WarLog, 1), (Feature::MemberActivity, 2)]);
        let mut next = link("#2PP", &[(Feature::WarLog, 3)]);
        next.merge_previous(&previous);
        assert_eq!(next.binding(Feature::WarLog).unwrap().channel, EntityId(3));
        assert_eq!(
            next.binding(Feature::MemberActivity).unwrap().channel,
            EntityId(2)
        );
    }

    #[test]
    fn merge_ignores_other_clans() {
        let previous = link("#2PP", &[(Feature::MemberActivity, 2)]);
        let mut next = link("#8QU8J9LP", &[]);
        next.merge_previous(&previous);
        assert!(next.bindings.is_empty());
    }

    #[tokio::test]
    async fn unavailable_store_fails() {
        let store = MemoryAssociationStore::new();
        store.put(link("#2PP", &[])).await.unwrap();
        store.set_unavailable(true);
        assert!(store.get(WorkspaceId(1)).await.is_err());
        store.set_unavailable(false);
        assert!(store.get(WorkspaceId(1)).await.unwrap().is_some());
    }

    #[test]
    fn link_serializes_feature_keys() {
        let json = serde_json::to_value(link("#2PP", &[(Feature::WarLog, 1)])).unwrap();
        assert_eq!(json["notifications"]["war-log"], true);
        assert_eq!(json["bindings"][0]["feature"], "war-log");
    }
}
