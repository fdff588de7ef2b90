//! Testing utilities for the clanforge workspace
//!
//! Shared fixtures: seeded simulated workspaces, live entity builders and a
//! fully wired unthrottled [`Provisioner`].

use clanforge_core::{ProvisionConfig, Provisioner};
use clanforge_graph::{
    ChannelKind, EntityId, LiveCategory, LiveChannel, LiveGraph, LiveRole, Permissions,
    PlatformClient, SimulatedPlatform, WorkspaceId,
};
use clanforge_snapshot::{MemorySnapshotStore, SnapshotStore};
use clanforge_wizard::{ClanAssociationStore, MemoryAssociationStore};
use std::sync::Arc;
use std::time::Duration;

/// Workspace used by fixtures
pub const TEST_WORKSPACE: WorkspaceId = WorkspaceId(4242);

/// Simulator holding an empty [`TEST_WORKSPACE`]
pub fn seeded_platform() -> Arc<SimulatedPlatform> {
    let sim = Arc::new(SimulatedPlatform::new());
    sim.seed_workspace(TEST_WORKSPACE);
    sim
}

/// Configuration with no mutation delay
pub fn test_config() -> ProvisionConfig {
    ProvisionConfig::new().with_mutation_delay(Duration::ZERO)
}

/// Provisioner over in-memory collaborators
pub struct TestContext {
    /// Seeded platform
    pub sim: Arc<SimulatedPlatform>,
    /// Snapshot store the provisioner writes to
    pub snapshots: Arc<MemorySnapshotStore>,
    /// Association store the provisioner writes to
    pub links: Arc<MemoryAssociationStore>,
    /// Provisioner wired to the above
    pub provisioner: Provisioner,
}

/// Build a [`TestContext`] with `config`
pub fn test_context_with(config: ProvisionConfig) -> TestContext {
    let sim = seeded_platform();
    let snapshots = Arc::new(MemorySnapshotStore::new());
    let links = Arc::new(MemoryAssociationStore::new());

    let platform: Arc<dyn PlatformClient> = sim.clone();
    let store: Arc<dyn SnapshotStore> = snapshots.clone();
    let associations: Arc<dyn ClanAssociationStore> = links.clone();
    let provisioner = Provisioner::builder(platform)
        .with_config(config)
        .with_snapshot_store(store)
        .with_association_store(associations)
        .build()
        .expect("test provisioner config is valid");

    TestContext {
        sim,
        snapshots,
        links,
        provisioner,
    }
}

/// Build a [`TestContext`] with [`test_config`]
pub fn test_context() -> TestContext {
    test_context_with(test_config())
}

/// Non-default role with member permissions
pub fn live_role(id: u64, name: &str, position: i32) -> LiveRole {
    LiveRole {
        id: EntityId(id),
        name: name.to_string(),
        color: 0x99_aa_bb,
        permissions: Permissions::MEMBER_BASE,
        position,
        hoist: false,
        mentionable: true,
        is_default: false,
    }
}

/// Category with no overwrites
pub fn live_category(id: u64, name: &str, position: i32) -> LiveCategory {
    LiveCategory {
        id: EntityId(id),
        name: name.to_string(),
        position,
        overwrites: Vec::new(),
    }
}

/// Text channel with no topic or overwrites
pub fn live_text_channel(id: u64, name: &str, parent: Option<u64>) -> LiveChannel {
    LiveChannel {
        id: EntityId(id),
        name: name.to_string(),
        kind: ChannelKind::Text,
        topic: None,
        parent: parent.map(EntityId),
        position: 0,
        overwrites: Vec::new(),
    }
}

/// Sorted names of every category and channel in `graph`
pub fn structure_names(graph: &LiveGraph) -> Vec<String> {
    let mut names: Vec<String> = graph
        .categories
        .iter()
        .map(|c| c.name.clone())
        .chain(graph.channels.iter().map(|c| c.name.clone()))
        .collect();
    names.sort();
    names
}
