//! In-memory platform
//!
//! [`SimulatedPlatform`] implements [`PlatformClient`] over in-memory
//! workspaces. It records every call in order and can be told to fail
//! specific operations, which makes it the backbone of the integration
//! tests and of the offline `clanforge` binary (which persists a
//! [`SimulatedWorkspace`] as JSON between runs).

use crate::entity::{
    LiveCategory, LiveChannel, LiveGraph, LiveRole, NewCategory, NewChannel, NewRole, Overwrite,
    OverwriteSubject,
};
use crate::ids::{EntityId, WorkspaceId};
use crate::normalize::normalize_name;
use crate::permissions::Permissions;
use crate::platform::{PlatformClient, PlatformError};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

/// First identifier handed out by a fresh simulator
const FIRST_ID: u64 = 1_000;

/// A recorded platform call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    /// Category listing
    ListCategories(WorkspaceId),
    /// Channel listing
    ListChannels(WorkspaceId),
    /// Role listing
    ListRoles(WorkspaceId),
    /// Category creation
    CreateCategory { name: String },
    /// Channel creation
    CreateChannel { name: String, parent: Option<EntityId> },
    /// Role creation
    CreateRole { name: String },
    /// Overwrite edit
    EditOverwrite { target: EntityId, subject: OverwriteSubject },
}

impl PlatformCall {
    /// Whether the call mutates the workspace
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::ListCategories(_) | Self::ListChannels(_) | Self::ListRoles(_)
        )
    }
}

/// Serializable state of one simulated workspace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedWorkspace {
    /// Workspace this state belongs to
    pub workspace_id: WorkspaceId,
    /// Next id to hand out
    pub next_id: u64,
    /// Current entities
    pub graph: LiveGraph,
}

#[derive(Debug, Default)]
struct Faults {
    /// Normalized names whose creation fails
    create: HashSet<String>,
    /// Targets whose overwrite edits fail
    overwrite: HashSet<EntityId>,
    /// Workspaces whose listings fail
    listing: HashSet<WorkspaceId>,
}

/// In-memory [`PlatformClient`]
#[derive(Debug)]
pub struct SimulatedPlatform {
    workspaces: Mutex<HashMap<WorkspaceId, LiveGraph>>,
    next_id: AtomicU64,
    calls: Mutex<Vec<PlatformCall>>,
    faults: Mutex<Faults>,
}

impl SimulatedPlatform {
    /// Create an empty simulator with no workspaces
    #[must_use]
    pub fn new() -> Self {
        Self {
            workspaces: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(FIRST_ID),
            calls: Mutex::new(Vec::new()),
            faults: Mutex::new(Faults::default()),
        }
    }

    /// Restore a simulator from persisted workspace state
    #[must_use]
    pub fn from_workspace(state: SimulatedWorkspace) -> Self {
        let sim = Self::new();
        sim.next_id.store(state.next_id.max(FIRST_ID), Ordering::SeqCst);
        sim.workspaces.lock().insert(state.workspace_id, state.graph);
        sim
    }

    /// Export one workspace for persistence
    #[must_use]
    pub fn export(&self, workspace: WorkspaceId) -> Option<SimulatedWorkspace> {
        let graph = self.workspaces.lock().get(&workspace).cloned()?;
        Some(SimulatedWorkspace {
            workspace_id: workspace,
            next_id: self.next_id.load(Ordering::SeqCst),
            graph,
        })
    }

    /// Create an empty workspace holding only the default role
    ///
    /// The default role shares the workspace's numeric id, as on the real
    /// platform.
    pub fn seed_workspace(&self, workspace: WorkspaceId) {
        let everyone = LiveRole {
            id: EntityId(workspace.0),
            name: "@everyone".to_string(),
            color: 0,
            permissions: Permissions::MEMBER_BASE,
            position: 0,
            hoist: false,
            mentionable: false,
            is_default: true,
        };
        self.workspaces.lock().insert(
            workspace,
            LiveGraph {
                roles: vec![everyone],
                ..LiveGraph::default()
            },
        );
    }

    /// Replace a workspace's graph wholesale
    pub fn install_graph(&self, workspace: WorkspaceId, graph: LiveGraph) {
        self.workspaces.lock().insert(workspace, graph);
    }

    /// Current graph of a workspace
    #[must_use]
    pub fn graph(&self, workspace: WorkspaceId) -> Option<LiveGraph> {
        self.workspaces.lock().get(&workspace).cloned()
    }

    /// Make creation of any entity with this (normalized) name fail
    pub fn fail_create(&self, name: &str) {
        self.faults.lock().create.insert(normalize_name(name));
    }

    /// Make overwrite edits on `target` fail
    pub fn fail_overwrite_on(&self, target: EntityId) {
        self.faults.lock().overwrite.insert(target);
    }

    /// Make every listing of `workspace` fail
    pub fn fail_listing(&self, workspace: WorkspaceId) {
        self.faults.lock().listing.insert(workspace);
    }

    /// Remove all injected faults
    pub fn clear_faults(&self) {
        *self.faults.lock() = Faults::default();
    }

    /// Calls recorded so far, in issue order
    #[must_use]
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().clone()
    }

    /// Mutating calls recorded so far, in issue order
    #[must_use]
    pub fn mutations(&self) -> Vec<PlatformCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    /// Forget the call log
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: PlatformCall) {
        self.calls.lock().push(call);
    }

    fn mint(&self) -> EntityId {
        EntityId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn check_create(&self, name: &str) -> Result<(), PlatformError> {
        if self.faults.lock().create.contains(&normalize_name(name)) {
            return Err(PlatformError::Transport(format!(
                "injected failure creating {name}"
            )));
        }
        Ok(())
    }

    fn check_listing(&self, workspace: WorkspaceId) -> Result<(), PlatformError> {
        if self.faults.lock().listing.contains(&workspace) {
            return Err(PlatformError::Transport(format!(
                "injected failure listing {workspace}"
            )));
        }
        Ok(())
    }

    fn with_graph<T>(
        &self,
        workspace: WorkspaceId,
        f: impl FnOnce(&mut LiveGraph) -> Result<T, PlatformError>,
    ) -> Result<T, PlatformError> {
        let mut guard = self.workspaces.lock();
        let graph = guard
            .get_mut(&workspace)
            .ok_or_else(|| PlatformError::NotFound(format!("workspace {workspace}")))?;
        f(graph)
    }
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

fn next_position<I: Iterator<Item = i32>>(positions: I) -> i32 {
    positions.max().map_or(0, |p| p + 1)
}

fn upsert(list: &mut Vec<Overwrite>, overwrite: Overwrite) {
    match list.iter_mut().find(|o| o.subject == overwrite.subject) {
        Some(existing) => *existing = overwrite,
        None => list.push(overwrite),
    }
}

#[async_trait]
impl PlatformClient for SimulatedPlatform {
    async fn list_categories(
        &self,
        workspace: WorkspaceId,
    ) -> Result<Vec<LiveCategory>, PlatformError> {
        self.record(PlatformCall::ListCategories(workspace));
        self.check_listing(workspace)?;
        self.with_graph(workspace, |g| Ok(g.categories.clone()))
    }

    async fn list_channels(
        &self,
        workspace: WorkspaceId,
    ) -> Result<Vec<LiveChannel>, PlatformError> {
        self.record(PlatformCall::ListChannels(workspace));
        self.check_listing(workspace)?;
        self.with_graph(workspace, |g| Ok(g.channels.clone()))
    }

    async fn list_roles(&self, workspace: WorkspaceId) -> Result<Vec<LiveRole>, PlatformError> {
        self.record(PlatformCall::ListRoles(workspace));
        self.check_listing(workspace)?;
        self.with_graph(workspace, |g| Ok(g.roles.clone()))
    }

    async fn create_category(
        &self,
        workspace: WorkspaceId,
        spec: NewCategory,
    ) -> Result<LiveCategory, PlatformError> {
        self.record(PlatformCall::CreateCategory {
            name: spec.name.clone(),
        });
        self.check_create(&spec.name)?;
        let id = self.mint();
        self.with_graph(workspace, |g| {
            let position = spec
                .position
                .unwrap_or_else(|| next_position(g.categories.iter().map(|c| c.position)));
            let category = LiveCategory {
                id,
                name: spec.name,
                position,
                overwrites: spec.overwrites,
            };
            g.categories.push(category.clone());
            Ok(category)
        })
    }

    async fn create_channel(
        &self,
        workspace: WorkspaceId,
        spec: NewChannel,
    ) -> Result<LiveChannel, PlatformError> {
        self.record(PlatformCall::CreateChannel {
            name: spec.name.clone(),
            parent: spec.parent,
        });
        self.check_create(&spec.name)?;
        let id = self.mint();
        self.with_graph(workspace, |g| {
            if let Some(parent) = spec.parent {
                if !g.categories.iter().any(|c| c.id == parent) {
                    return Err(PlatformError::Rejected(format!(
                        "unknown parent category {parent}"
                    )));
                }
            }
            let position = spec.position.unwrap_or_else(|| {
                next_position(
                    g.channels
                        .iter()
                        .filter(|c| c.parent == spec.parent)
                        .map(|c| c.position),
                )
            });
            let channel = LiveChannel {
                id,
                name: spec.name,
                kind: spec.kind,
                topic: spec.topic,
                parent: spec.parent,
                position,
                overwrites: Vec::new(),
            };
            g.channels.push(channel.clone());
            Ok(channel)
        })
    }

    async fn create_role(
        &self,
        workspace: WorkspaceId,
        spec: NewRole,
    ) -> Result<LiveRole, PlatformError> {
        self.record(PlatformCall::CreateRole {
            name: spec.name.clone(),
        });
        self.check_create(&spec.name)?;
        let id = self.mint();
        self.with_graph(workspace, |g| {
            let role = LiveRole {
                id,
                name: spec.name,
                color: spec.color,
                permissions: spec.permissions,
                position: next_position(g.roles.iter().map(|r| r.position)),
                hoist: spec.hoist,
                mentionable: spec.mentionable,
                is_default: false,
            };
            g.roles.push(role.clone());
            Ok(role)
        })
    }

    async fn edit_overwrite(
        &self,
        workspace: WorkspaceId,
        target: EntityId,
        overwrite: Overwrite,
    ) -> Result<(), PlatformError> {
        self.record(PlatformCall::EditOverwrite {
            target,
            subject: overwrite.subject,
        });
        if self.faults.lock().overwrite.contains(&target) {
            return Err(PlatformError::Transport(format!(
                "injected failure editing overwrite on {target}"
            )));
        }
        self.with_graph(workspace, |g| {
            if let OverwriteSubject::Role(role) = overwrite.subject {
                if !g.roles.iter().any(|r| r.id == role) {
                    return Err(PlatformError::Rejected(format!("unknown role {role}")));
                }
            }
            if let Some(category) = g.categories.iter_mut().find(|c| c.id == target) {
                upsert(&mut category.overwrites, overwrite);
                return Ok(());
            }
            if let Some(channel) = g.channels.iter_mut().find(|c| c.id == target) {
                upsert(&mut channel.overwrites, overwrite);
                return Ok(());
            }
            Err(PlatformError::NotFound(format!("channel {target}")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ChannelKind;
    use crate::platform::fetch_graph;

    const WS: WorkspaceId = WorkspaceId(1);

    #[tokio::test]
    async fn create_and_list() {
        let sim = SimulatedPlatform::new();
        sim.seed_workspace(WS);

        let cat = sim.create_category(WS, NewCategory::named("Info")).await.unwrap();
        let ch = sim
            .create_channel(
                WS,
                NewChannel {
                    name: "rules".into(),
                    kind: ChannelKind::Text,
                    topic: None,
                    parent: Some(cat.id),
                    position: None,
                },
            )
            .await
            .unwrap();

        let graph = fetch_graph(&sim, WS).await.unwrap();
        assert_eq!(graph.categories.len(), 1);
        assert_eq!(graph.channels[0].id, ch.id);
        assert_eq!(graph.channels[0].parent, Some(cat.id));
        assert_eq!(graph.roles.len(), 1);
        assert!(graph.roles[0].is_default);
    }

    #[tokio::test]
    async fn injected_create_failure() {
        let sim = SimulatedPlatform::new();
        sim.seed_workspace(WS);
        sim.fail_create("War Log");

        let err = sim
            .create_category(WS, NewCategory::named("war-log"))
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert!(sim.graph(WS).unwrap().categories.is_empty());
    }

    #[tokio::test]
    async fn channel_with_unknown_parent_rejected() {
        let sim = SimulatedPlatform::new();
        sim.seed_workspace(WS);
        let err = sim
            .create_channel(
                WS,
                NewChannel {
                    name: "general".into(),
                    kind: ChannelKind::Text,
                    topic: None,
                    parent: Some(EntityId(5)),
                    position: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Rejected(_)));
    }

    #[tokio::test]
    async fn overwrite_replaces_per_subject() {
        let sim = SimulatedPlatform::new();
        sim.seed_workspace(WS);
        let cat = sim.create_category(WS, NewCategory::named("Info")).await.unwrap();

        let first = Overwrite::new(
            OverwriteSubject::Everyone,
            Permissions::VIEW_CHANNEL,
            Permissions::empty(),
        );
        let second = Overwrite::new(
            OverwriteSubject::Everyone,
            Permissions::empty(),
            Permissions::VIEW_CHANNEL,
        );
        sim.edit_overwrite(WS, cat.id, first).await.unwrap();
        sim.edit_overwrite(WS, cat.id, second).await.unwrap();

        let graph = sim.graph(WS).unwrap();
        assert_eq!(graph.categories[0].overwrites, vec![second]);
    }

    #[tokio::test]
    async fn overwrite_for_unknown_role_rejected() {
        let sim = SimulatedPlatform::new();
        sim.seed_workspace(WS);
        let cat = sim.create_category(WS, NewCategory::named("Info")).await.unwrap();
        let err = sim
            .edit_overwrite(
                WS,
                cat.id,
                Overwrite::new(
                    OverwriteSubject::Role(EntityId(424_242)),
                    Permissions::VIEW_CHANNEL,
                    Permissions::empty(),
                ),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Rejected(_)));
    }

    #[tokio::test]
    async fn export_round_trip_keeps_id_sequence() {
        let sim = SimulatedPlatform::new();
        sim.seed_workspace(WS);
        let first = sim.create_category(WS, NewCategory::named("A")).await.unwrap();

        let state = sim.export(WS).unwrap();
        let json = serde_json::to_string(&state).unwrap();
        let restored = SimulatedPlatform::from_workspace(serde_json::from_str(&json).unwrap());
        let second = restored
            .create_category(WS, NewCategory::named("B"))
            .await
            .unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn call_log_separates_mutations() {
        let sim = SimulatedPlatform::new();
        sim.seed_workspace(WS);
        let _ = fetch_graph(&sim, WS).await.unwrap();
        let _ = sim.create_category(WS, NewCategory::named("A")).await.unwrap();
        assert_eq!(sim.calls().len(), 4);
        assert_eq!(
            sim.mutations(),
            vec![PlatformCall::CreateCategory { name: "A".into() }]
        );
    }
}
