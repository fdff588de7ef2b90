use clanforge_graph::{
    fetch_graph, ChannelKind, EntityId, ErrorClass, LiveCategory, LiveChannel, LiveGraph, LiveRole,
    Overwrite, OverwriteSubject, PlatformCall, Permissions, SimulatedPlatform, Throttle,
    WorkspaceId,
};
use clanforge_snapshot::{
    capture, FileSnapshotStore, RestoreEngine, SnapshotError, SnapshotStore,
    UnmappedSubjectPolicy,
};
use pretty_assertions::assert_eq;

const WS: WorkspaceId = WorkspaceId(42);

fn role(id: u64, name: &str, position: i32) -> LiveRole {
    LiveRole {
        id: EntityId(id),
        name: name.to_string(),
        color: 0x33_66_99,
        permissions: Permissions::MEMBER_BASE,
        position,
        hoist: true,
        mentionable: false,
        is_default: false,
    }
}

fn everyone() -> LiveRole {
    LiveRole {
        id: EntityId(WS.0),
        name: "@everyone".to_string(),
        color: 0,
        permissions: Permissions::READ,
        position: 0,
        hoist: false,
        mentionable: false,
        is_default: true,
    }
}

/// Two roles, one category with two channels, overwrites on both levels
fn clan_graph() -> LiveGraph {
    let hide = Overwrite::new(
        OverwriteSubject::Everyone,
        Permissions::empty(),
        Permissions::VIEW_CHANNEL,
    );
    let leaders = Overwrite::new(
        OverwriteSubject::Role(EntityId(11)),
        Permissions::READ | Permissions::SEND_MESSAGES,
        Permissions::empty(),
    );
    let members = Overwrite::new(
        OverwriteSubject::Role(EntityId(12)),
        Permissions::READ,
        Permissions::SEND_MESSAGES,
    );
    LiveGraph {
        categories: vec![LiveCategory {
            id: EntityId(20),
            name: "Clan Wars".to_string(),
            position: 0,
            overwrites: vec![hide, leaders],
        }],
        channels: vec![
            LiveChannel {
                id: EntityId(30),
                name: "war-log".to_string(),
                kind: ChannelKind::Text,
                topic: Some("results".to_string()),
                parent: Some(EntityId(20)),
                position: 0,
                overwrites: vec![leaders, members],
            },
            LiveChannel {
                id: EntityId(31),
                name: "War Comms".to_string(),
                kind: ChannelKind::Voice,
                topic: None,
                parent: Some(EntityId(20)),
                position: 1,
                overwrites: Vec::new(),
            },
        ],
        roles: vec![everyone(), role(12, "Member", 5), role(11, "Leader", 10)],
    }
}

fn source() -> SimulatedPlatform {
    let sim = SimulatedPlatform::new();
    sim.install_graph(WS, clan_graph());
    sim
}

fn fresh() -> SimulatedPlatform {
    let sim = SimulatedPlatform::new();
    sim.seed_workspace(WS);
    sim
}

#[tokio::test]
async fn higher_roles_are_recreated_first() {
    let snapshot = capture(&source(), WS).await.unwrap();
    let target = fresh();
    let throttle = Throttle::unthrottled();

    let report = RestoreEngine::new(&target, &throttle)
        .restore(WS, &snapshot)
        .await
        .unwrap();
    assert_eq!(report.roles_restored, 2);

    let role_calls: Vec<_> = target
        .mutations()
        .into_iter()
        .filter_map(|c| match c {
            PlatformCall::CreateRole { name } => Some(name),
            _ => None,
        })
        .collect();
    assert_eq!(role_calls, vec!["Leader".to_string(), "Member".to_string()]);
}

#[tokio::test]
async fn restored_graph_is_referentially_intact() {
    let snapshot = capture(&source(), WS).await.unwrap();
    let target = fresh();
    let throttle = Throttle::unthrottled();

    let report = RestoreEngine::new(&target, &throttle)
        .restore(WS, &snapshot)
        .await
        .unwrap();
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.channels_restored, 3);
    assert_eq!(report.overwrites_applied, 4);

    let graph = target.graph(WS).unwrap();
    assert!(graph.dangling_references().is_empty());

    // the leader overwrite now points at the recreated leader role
    let leader = graph.role_named("Leader").unwrap().id;
    assert_ne!(leader, EntityId(11));
    assert_eq!(report.id_map[&EntityId(11)], leader);
    let war_log = graph.channels.iter().find(|c| c.name == "war-log").unwrap();
    assert!(war_log.overwrite_for(OverwriteSubject::Role(leader)).is_some());
    assert_eq!(war_log.topic.as_deref(), Some("results"));
    assert_eq!(war_log.parent, Some(report.id_map[&EntityId(20)]));
}

#[tokio::test]
async fn restoring_over_the_source_changes_nothing() {
    let sim = source();
    let snapshot = capture(&sim, WS).await.unwrap();
    sim.clear_calls();
    let throttle = Throttle::unthrottled();

    let report = RestoreEngine::new(&sim, &throttle)
        .restore(WS, &snapshot)
        .await
        .unwrap();
    assert_eq!(report.created(), 0);
    assert_eq!(report.overwrites_applied, 0);
    assert!(sim.mutations().is_empty());
    assert_eq!(report.id_map[&EntityId(30)], EntityId(30));
}

#[tokio::test]
async fn cross_workspace_restore_is_refused() {
    let snapshot = capture(&source(), WS).await.unwrap();
    let other = SimulatedPlatform::new();
    other.seed_workspace(WorkspaceId(99));
    let throttle = Throttle::unthrottled();

    let err = RestoreEngine::new(&other, &throttle)
        .restore(WorkspaceId(99), &snapshot)
        .await
        .unwrap_err();
    assert!(matches!(err, SnapshotError::WorkspaceMismatch { .. }));
    assert!(other.mutations().is_empty());
    assert_eq!(fetch_graph(&other, WorkspaceId(99)).await.unwrap().entity_count(), 0);
}

#[tokio::test]
async fn failed_role_drops_only_its_overwrites() {
    let snapshot = capture(&source(), WS).await.unwrap();
    let target = fresh();
    target.fail_create("Member");
    let throttle = Throttle::unthrottled();

    let report = RestoreEngine::new(&target, &throttle)
        .restore(WS, &snapshot)
        .await
        .unwrap();
    assert_eq!(report.roles_restored, 1);
    assert_eq!(report.channels_restored, 3);
    assert_eq!(report.overwrites_applied, 3);

    let classes: Vec<_> = report.errors.iter().map(|e| e.class).collect();
    assert_eq!(
        classes,
        vec![ErrorClass::Transport, ErrorClass::UnresolvedReference]
    );
    assert!(target.graph(WS).unwrap().dangling_references().is_empty());
}

#[tokio::test]
async fn keep_original_submits_foreign_ids() {
    let snapshot = capture(&source(), WS).await.unwrap();
    let target = fresh();
    target.fail_create("Member");
    let throttle = Throttle::unthrottled();

    let report = RestoreEngine::new(&target, &throttle)
        .with_unmapped_subjects(UnmappedSubjectPolicy::KeepOriginal)
        .restore(WS, &snapshot)
        .await
        .unwrap();
    // the stale id reaches the platform, which rejects it
    assert!(target.mutations().iter().any(|c| matches!(
        c,
        PlatformCall::EditOverwrite { subject: OverwriteSubject::Role(EntityId(12)), .. }
    )));
    assert!(report
        .errors
        .iter()
        .all(|e| e.class == ErrorClass::Transport));
    assert_eq!(report.errors.len(), 2);
}

#[tokio::test]
async fn orphaned_channel_goes_top_level() {
    let mut snapshot = capture(&source(), WS).await.unwrap();
    snapshot.categories.clear();
    let target = fresh();
    let throttle = Throttle::unthrottled();

    let report = RestoreEngine::new(&target, &throttle)
        .restore(WS, &snapshot)
        .await
        .unwrap();
    assert_eq!(report.channels_restored, 2);
    let graph = target.graph(WS).unwrap();
    assert!(graph.channels.iter().all(|c| c.parent.is_none()));
    assert!(graph.dangling_references().is_empty());
}

fn text_channel(id: u64, name: &str, parent: u64, position: i32) -> LiveChannel {
    LiveChannel {
        id: EntityId(id),
        name: name.to_string(),
        kind: ChannelKind::Text,
        topic: None,
        parent: Some(EntityId(parent)),
        position,
        overwrites: Vec::new(),
    }
}

fn category(id: u64, name: &str, position: i32) -> LiveCategory {
    LiveCategory {
        id: EntityId(id),
        name: name.to_string(),
        position,
        overwrites: Vec::new(),
    }
}

#[tokio::test]
async fn same_named_channels_are_not_merged() {
    let sim = SimulatedPlatform::new();
    sim.install_graph(
        WS,
        LiveGraph {
            categories: vec![category(1, "War", 0), category(2, "Social", 1)],
            channels: vec![
                text_channel(10, "general", 1, 0),
                text_channel(11, "general", 2, 1),
            ],
            roles: vec![everyone()],
        },
    );
    let snapshot = capture(&sim, WS).await.unwrap();

    let mut damaged = sim.graph(WS).unwrap();
    damaged.channels.retain(|c| c.id != EntityId(11));
    sim.install_graph(WS, damaged);
    let throttle = Throttle::unthrottled();

    let report = RestoreEngine::new(&sim, &throttle)
        .restore(WS, &snapshot)
        .await
        .unwrap();
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.channels_restored, 1);
    assert_eq!(report.id_map[&EntityId(10)], EntityId(10));
    assert_ne!(report.id_map[&EntityId(11)], EntityId(10));

    let graph = sim.graph(WS).unwrap();
    let under_social = graph
        .channels
        .iter()
        .filter(|c| c.parent == Some(EntityId(2)))
        .count();
    assert_eq!(under_social, 1);
}

#[tokio::test]
async fn name_match_prefers_an_unclaimed_channel_under_the_same_parent() {
    let sim = SimulatedPlatform::new();
    sim.install_graph(
        WS,
        LiveGraph {
            categories: vec![category(1, "War", 0), category(2, "Social", 1)],
            channels: vec![text_channel(10, "chat", 1, 0), text_channel(11, "chat", 2, 1)],
            roles: vec![everyone()],
        },
    );
    let snapshot = capture(&sim, WS).await.unwrap();

    // both channels recreated by hand, so neither keeps its old id
    let mut recreated = sim.graph(WS).unwrap();
    recreated.channels = vec![text_channel(50, "chat", 2, 0), text_channel(51, "chat", 1, 1)];
    sim.install_graph(WS, recreated);
    sim.clear_calls();
    let throttle = Throttle::unthrottled();

    let report = RestoreEngine::new(&sim, &throttle)
        .restore(WS, &snapshot)
        .await
        .unwrap();
    assert_eq!(report.channels_restored, 0);
    assert_eq!(report.id_map[&EntityId(10)], EntityId(51));
    assert_eq!(report.id_map[&EntityId(11)], EntityId(50));
    assert!(sim.mutations().is_empty());
}

#[tokio::test]
async fn file_store_round_trip_and_listing_order() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = FileSnapshotStore::new(dir.path());
    let sim = source();

    let older = capture(&sim, WS).await.unwrap();
    store.put(&older).await.unwrap();
    let mut newer = capture(&sim, WS).await.unwrap();
    newer.created_at = older.created_at + chrono::Duration::seconds(5);
    store.put(&newer).await.unwrap();

    let metas = store.list(WS).await.unwrap();
    let ids: Vec<_> = metas.iter().map(|m| m.snapshot_id).collect();
    assert_eq!(ids, vec![newer.snapshot_id, older.snapshot_id]);
    assert_eq!(metas[0].role_count, 2);
    assert_eq!(metas[0].channel_count, 2);

    let loaded = store.get(WS, older.snapshot_id).await.unwrap();
    assert_eq!(loaded, older);
}
