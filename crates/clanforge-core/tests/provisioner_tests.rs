use clanforge_core::{ProvisionConfig, ProvisionError, Provisioner};
use clanforge_graph::{PlatformClient, SimulatedPlatform, UserId};
use clanforge_snapshot::{SnapshotError, SnapshotId};
use clanforge_test_utils::{structure_names, test_config, test_context, TEST_WORKSPACE};
use clanforge_wizard::WizardStep;
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[tokio::test]
async fn applying_a_template_twice_creates_nothing_new() {
    let ctx = test_context();
    let first = ctx
        .provisioner
        .apply_template(TEST_WORKSPACE, "standard")
        .await
        .unwrap();
    assert_eq!(first.created.len(), 17);
    assert!(first.skipped.is_empty());

    let second = ctx
        .provisioner
        .apply_template(TEST_WORKSPACE, "Standard")
        .await
        .unwrap();
    assert!(second.created.is_empty());
    assert_eq!(second.skipped.len(), 17);

    let plan = ctx
        .provisioner
        .plan_template(TEST_WORKSPACE, "standard")
        .await
        .unwrap();
    assert_eq!(plan.to_create(), 0);
}

#[tokio::test]
async fn unknown_template_fails_before_any_call() {
    let ctx = test_context();
    let err = ctx
        .provisioner
        .apply_template(TEST_WORKSPACE, "castle")
        .await
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, ProvisionError::Catalog(_)));
    assert!(ctx.sim.calls().is_empty());
}

#[tokio::test]
async fn snapshot_restores_a_wiped_workspace() {
    let ctx = test_context();
    ctx.provisioner
        .apply_template(TEST_WORKSPACE, "minimal")
        .await
        .unwrap();
    let before = structure_names(&ctx.sim.graph(TEST_WORKSPACE).unwrap());

    let meta = ctx.provisioner.create_snapshot(TEST_WORKSPACE).await.unwrap();
    assert_eq!(meta.category_count, 1);
    assert_eq!(meta.channel_count, 4);
    assert_eq!(ctx.snapshots.len(), 1);

    ctx.sim.seed_workspace(TEST_WORKSPACE);
    let report = ctx
        .provisioner
        .restore_snapshot(TEST_WORKSPACE, meta.snapshot_id)
        .await
        .unwrap();
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.channels_restored, 5);

    let graph = ctx.sim.graph(TEST_WORKSPACE).unwrap();
    assert_eq!(structure_names(&graph), before);
    assert!(graph.dangling_references().is_empty());
}

#[tokio::test]
async fn missing_snapshot_is_fatal() {
    let ctx = test_context();
    let err = ctx
        .provisioner
        .restore_snapshot(TEST_WORKSPACE, SnapshotId::generate())
        .await
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, ProvisionError::Snapshot(SnapshotError::NotFound { .. })));
    assert!(ctx.sim.mutations().is_empty());
}

#[tokio::test]
async fn snapshots_accumulate() {
    let ctx = test_context();
    let first = ctx.provisioner.create_snapshot(TEST_WORKSPACE).await.unwrap();
    let second = ctx.provisioner.create_snapshot(TEST_WORKSPACE).await.unwrap();
    assert_ne!(first.snapshot_id, second.snapshot_id);

    let listed = ctx.provisioner.list_snapshots(TEST_WORKSPACE).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed[0].created_at >= listed[1].created_at);
}

#[tokio::test]
async fn unknown_default_template_is_rejected_at_build() {
    let platform: Arc<dyn PlatformClient> = Arc::new(SimulatedPlatform::new());
    let err = Provisioner::builder(platform)
        .with_config(test_config().with_default_template("castle"))
        .build()
        .unwrap_err();
    assert!(err.is_fatal());
}

#[tokio::test]
async fn invalid_config_is_rejected_at_build() {
    let platform: Arc<dyn PlatformClient> = Arc::new(SimulatedPlatform::new());
    let config = ProvisionConfig {
        max_sessions: 0,
        ..test_config()
    };
    let err = Provisioner::builder(platform)
        .with_config(config)
        .build()
        .unwrap_err();
    assert!(matches!(err, ProvisionError::Config(_)));
}

#[tokio::test]
async fn wizard_uses_configured_default_template() {
    let ctx = clanforge_test_utils::test_context_with(test_config().with_default_template("competitive"));
    let view = ctx
        .provisioner
        .wizard()
        .start(TEST_WORKSPACE, UserId(3))
        .await
        .unwrap();
    assert_eq!(view.step, WizardStep::Welcome);
    assert_eq!(view.selections.template, "competitive");
}
