use clanforge_catalog::TemplateCatalog;
use clanforge_graph::{PlatformClient, SimulatedPlatform, Throttle, UserId, WorkspaceId};
use clanforge_wizard::{
    ClanAssociationStore, Feature, MemoryAssociationStore, NoProgress, Orchestrator,
    ProgressEvent, ProgressSink, Reply, SessionError, SessionHandle, Stage, StageStatus,
    StepView, WizardAction, WizardConfig, WizardStep,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const WS: WorkspaceId = WorkspaceId(77);
const OWNER: UserId = UserId(1);
const OTHER: UserId = UserId(2);

struct Harness {
    sim: Arc<SimulatedPlatform>,
    links: Arc<MemoryAssociationStore>,
    wizard: Orchestrator,
}

fn harness() -> Harness {
    harness_with(WizardConfig::default())
}

fn harness_with(config: WizardConfig) -> Harness {
    let sim = Arc::new(SimulatedPlatform::new());
    sim.seed_workspace(WS);
    let links = Arc::new(MemoryAssociationStore::new());
    let platform: Arc<dyn PlatformClient> = sim.clone();
    let store: Arc<dyn ClanAssociationStore> = links.clone();
    let wizard = Orchestrator::new(
        platform,
        Arc::new(Throttle::unthrottled()),
        Arc::new(TemplateCatalog::with_defaults()),
        store,
        config,
    );
    Harness { sim, links, wizard }
}

impl Harness {
    async fn act(&self, action: WizardAction) -> Result<Reply, SessionError> {
        self.wizard.interact(WS, OWNER, action, &NoProgress).await
    }

    async fn view(&self, action: WizardAction) -> StepView {
        match self.act(action).await.unwrap() {
            Reply::View(view) => view,
            other => panic!("expected a view, got {other:?}"),
        }
    }

    /// Start and walk to Confirmation with the minimal template
    async fn to_confirmation(&self) -> StepView {
        self.wizard.start(WS, OWNER).await.unwrap();
        self.view(WizardAction::Next).await;
        self.view(WizardAction::SetClanTag("#2pp".into())).await;
        self.view(WizardAction::Next).await;
        self.view(WizardAction::Choose("minimal".into())).await;
        self.view(WizardAction::Next).await;
        self.view(WizardAction::Next).await;
        self.view(WizardAction::Next).await;
        self.view(WizardAction::Toggle("member-activity".into()))
            .await;
        let view = self.view(WizardAction::Next).await;
        assert_eq!(view.step, WizardStep::Confirmation);
        view
    }
}

#[tokio::test]
async fn full_run_provisions_and_links_the_clan() {
    let h = harness();
    let confirmation = h.to_confirmation().await;
    assert!(
        confirmation.body.contains("1 categories, 4 channels and 4 roles"),
        "{}",
        confirmation.body
    );
    assert!(h.sim.mutations().is_empty());

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let reply = h
        .wizard
        .interact(WS, OWNER, WizardAction::Confirm, &tx)
        .await
        .unwrap();
    let Reply::Completed { summary, .. } = reply else {
        panic!("expected completion");
    };

    assert!(summary.is_clean(), "{}", summary.render(10));
    assert_eq!(summary.created.len(), 9);
    let stages: Vec<_> = summary.stages.iter().map(|s| s.stage).collect();
    assert_eq!(stages, Stage::ORDER.to_vec());

    let link = h.links.get(WS).await.unwrap().unwrap();
    assert_eq!(link.clan_tag, "#2PP");
    assert_eq!(link.linked_by, OWNER);
    let bound: Vec<_> = link
        .bindings
        .iter()
        .map(|b| (b.feature, b.channel_name.as_str()))
        .collect();
    assert_eq!(
        bound,
        vec![
            (Feature::WarLog, "war-log"),
            (Feature::MemberActivity, "general"),
            (Feature::Announcements, "announcements"),
        ]
    );
    assert_eq!(link.notifications[&Feature::WarReminders], false);

    drop(tx);
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    // start and finish of each stage, plus one event per remote mutation
    assert_eq!(events.len(), 8 + h.sim.mutations().len());
    assert!(events.iter().any(|e| e.stage == Stage::Roles && e.message == "role `Leader` created"));
    assert!(events.windows(2).all(|w| w[0].done <= w[1].done));
    assert_eq!(events.last().map(|e| e.done), Some(4));

    assert!(!h.wizard.registry().is_active(WS));
    assert!(matches!(
        h.act(WizardAction::Next).await,
        Err(SessionError::NoActiveSession(_))
    ));
}

#[tokio::test]
async fn other_users_cannot_drive_the_session() {
    let h = harness();
    h.wizard.start(WS, OWNER).await.unwrap();

    let err = h
        .wizard
        .interact(WS, OTHER, WizardAction::Next, &NoProgress)
        .await
        .unwrap_err();
    assert!(err.is_access_error());
    let err = h
        .wizard
        .interact(WS, OTHER, WizardAction::Cancel, &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NotOwner { .. }));

    assert_eq!(h.wizard.view(WS, OWNER).await.unwrap().step, WizardStep::Welcome);
}

#[tokio::test]
async fn one_session_per_workspace() {
    let h = harness();
    h.wizard.start(WS, OWNER).await.unwrap();
    assert_eq!(
        h.wizard.start(WS, OTHER).await.unwrap_err(),
        SessionError::AlreadyActive(WS)
    );
    // a different workspace is independent
    assert!(h.wizard.start(WorkspaceId(78), OTHER).await.is_ok());
}

#[tokio::test]
async fn cancel_discards_without_side_effects() {
    let h = harness();
    h.wizard.start(WS, OWNER).await.unwrap();
    h.view(WizardAction::Next).await;
    h.view(WizardAction::SetClanTag("#2PP".into())).await;
    h.view(WizardAction::Next).await;

    assert!(matches!(
        h.act(WizardAction::Cancel).await.unwrap(),
        Reply::Cancelled
    ));
    assert!(h.sim.mutations().is_empty());
    assert!(h.links.get(WS).await.unwrap().is_none());
    assert!(matches!(
        h.wizard.view(WS, OWNER).await,
        Err(SessionError::NoActiveSession(_))
    ));

    let restarted = h.wizard.start(WS, OTHER).await.unwrap();
    assert_eq!(restarted.step, WizardStep::Welcome);
    assert_eq!(restarted.selections.clan_tag, None);
}

/// Cancels the session once `after` reports completion
struct CancelAfter {
    handle: Arc<SessionHandle>,
    after: Stage,
}

impl ProgressSink for CancelAfter {
    fn report(&self, event: ProgressEvent) {
        if event.stage == self.after && event.done > 0 {
            self.handle.cancel();
        }
    }
}

#[tokio::test]
async fn cancel_during_provisioning_skips_remaining_stages() {
    let h = harness();
    h.to_confirmation().await;
    let sink = CancelAfter {
        handle: h.wizard.registry().get(WS, OWNER).await.unwrap(),
        after: Stage::Structure,
    };

    let Reply::Completed { summary, .. } = h
        .wizard
        .interact(WS, OWNER, WizardAction::Confirm, &sink)
        .await
        .unwrap()
    else {
        panic!("expected completion");
    };
    let statuses: Vec<_> = summary.stages.iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        vec![
            StageStatus::Success,
            StageStatus::Skipped,
            StageStatus::Skipped,
            StageStatus::Skipped,
        ]
    );
    assert_eq!(summary.created.len(), 5);
    assert!(h.links.get(WS).await.unwrap().is_none());
    assert!(!h.wizard.registry().is_active(WS));
}

#[tokio::test]
async fn failed_category_does_not_stop_later_stages() {
    let h = harness();
    h.sim.fail_create("Clan");
    h.to_confirmation().await;

    let Reply::Completed { summary, .. } = h.act(WizardAction::Confirm).await.unwrap() else {
        panic!("expected completion");
    };
    let status = |stage| summary.stage(stage).map(|s| s.status);
    assert_eq!(status(Stage::Structure), Some(StageStatus::Failed));
    assert_eq!(status(Stage::Roles), Some(StageStatus::Success));
    assert_eq!(status(Stage::Permissions), Some(StageStatus::Failed));
    assert_eq!(status(Stage::Features), Some(StageStatus::Failed));
    assert_eq!(summary.created.len(), 4);

    // 5 structure errors, 1 permissions failure, 3 unbound features
    assert_eq!(summary.error_count(), 9);
    let text = summary.render(2);
    assert!(text.ends_with("... and 7 more\n"), "{text}");
}

#[tokio::test]
async fn completion_report_respects_the_error_limit() {
    let h = harness_with(WizardConfig {
        summary_error_limit: 1,
        ..WizardConfig::default()
    });
    h.sim.fail_create("Leader");
    h.sim.fail_create("Elder");
    h.to_confirmation().await;

    let Reply::Completed { summary, report } = h.act(WizardAction::Confirm).await.unwrap() else {
        panic!("expected completion");
    };
    assert_eq!(summary.stage(Stage::Roles).map(|s| s.status), Some(StageStatus::Partial));
    let total = summary.error_count();
    assert!(total >= 2, "{report}");
    assert_eq!(report.lines().filter(|l| l.starts_with("- ")).count(), 1);
    assert!(
        report.ends_with(&format!("... and {} more\n", total - 1)),
        "{report}"
    );
    assert_eq!(report, summary.render(1));
}

#[tokio::test]
async fn second_run_finds_everything_in_place() {
    let h = harness();
    h.to_confirmation().await;
    h.act(WizardAction::Confirm).await.unwrap();
    h.sim.clear_calls();

    let confirmation = h.to_confirmation().await;
    assert!(confirmation.body.contains("0 categories, 0 channels and 0 roles"));
    assert!(confirmation.body.contains("9 already present"));

    let Reply::Completed { summary, .. } = h.act(WizardAction::Confirm).await.unwrap() else {
        panic!("expected completion");
    };
    assert!(summary.created.is_empty());
    assert_eq!(summary.stage(Stage::Permissions).unwrap().affected, 0);
    assert!(h.sim.mutations().is_empty());
}

#[tokio::test]
async fn unreadable_workspace_still_reaches_confirmation() {
    let h = harness();
    h.sim.fail_listing(WS);
    let confirmation = h.to_confirmation().await;
    assert!(confirmation.body.contains("could not be read"));
}
