//! Provisioning pipeline
//!
//! Runs on confirmation: Structure, Roles, Permissions, Features, always in
//! that order. Each stage re-reads the live graph, so a stage sees what the
//! previous one created. A failed stage is recorded and the next one still
//! runs with whatever was resolved. Cancellation is checked between stages
//! only; a stage already running finishes.
//!
//! Progress: one event when a stage starts, one per remote mutation inside
//! it, and one when it finishes.

use crate::association::{ClanAssociationStore, ClanLink};
use crate::features::bind_features;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::registry::SessionHandle;
use crate::selections::{Feature, Selections};
use crate::summary::ProvisionSummary;
use chrono::Utc;
use clanforge_catalog::TemplateCatalog;
use clanforge_graph::{
    fetch_graph, EntityError, EntityKind, PlatformClient, Throttle, UserId, WorkspaceId,
};
use clanforge_reconcile::{
    MutationOutcome, ReconcileObserver, ReconcileOutcome, Reconciler, ResolvedChannel,
    ResolvedRole,
};
use serde::Serialize;
use std::fmt;

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Categories and channels
    Structure,
    /// Roles
    Roles,
    /// Channel overwrites
    Permissions,
    /// Clan link and feature bindings
    Features,
}

impl Stage {
    /// Execution order
    pub const ORDER: [Stage; 4] = [
        Self::Structure,
        Self::Roles,
        Self::Permissions,
        Self::Features,
    ];

    /// Display label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Structure => "Structure",
            Self::Roles => "Roles",
            Self::Permissions => "Permissions",
            Self::Features => "Features",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a stage ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageStatus {
    /// Everything in place
    Success,
    /// Some entities failed
    Partial,
    /// Nothing done
    Failed,
    /// Not run (session cancelled)
    Skipped,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Result of one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    /// Stage this outcome belongs to
    pub stage: Stage,
    /// How it ended
    pub status: StageStatus,
    /// Entities created, overwrites edited or features bound
    pub affected: usize,
    /// Desired entities already in place
    pub present: usize,
    /// Per-entity failures
    pub errors: Vec<EntityError>,
    /// Stage-level failure (listing or store unavailable)
    pub failure: Option<String>,
}

impl StageOutcome {
    fn completed(stage: Stage, affected: usize, present: usize, errors: Vec<EntityError>) -> Self {
        let status = if errors.is_empty() {
            StageStatus::Success
        } else if affected + present > 0 {
            StageStatus::Partial
        } else {
            StageStatus::Failed
        };
        Self {
            stage,
            status,
            affected,
            present,
            errors,
            failure: None,
        }
    }

    fn from_report(stage: Stage, report: &impl ReconcileOutcome) -> Self {
        Self::completed(
            stage,
            report.affected(),
            report.already_present(),
            report.errors().to_vec(),
        )
    }

    fn failed(stage: Stage, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::error!(%stage, %reason, "stage failed");
        Self {
            stage,
            status: StageStatus::Failed,
            affected: 0,
            present: 0,
            errors: Vec::new(),
            failure: Some(reason),
        }
    }

    pub(crate) fn skipped(stage: Stage) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped,
            affected: 0,
            present: 0,
            errors: Vec::new(),
            failure: None,
        }
    }

    /// One-line description
    #[must_use]
    pub fn line(&self) -> String {
        let mut line = format!("{}: {}", self.stage, self.status);
        if self.status != StageStatus::Skipped && self.failure.is_none() {
            line.push_str(&format!(
                ", {} {}, {} already present",
                self.affected,
                self.stage_verb(),
                self.present
            ));
        }
        match self.errors.len() {
            0 => {}
            1 => line.push_str(", 1 error"),
            n => line.push_str(&format!(", {n} errors")),
        }
        line
    }

    fn stage_verb(&self) -> &'static str {
        match self.stage {
            Stage::Structure | Stage::Roles => "created",
            Stage::Permissions => "edited",
            Stage::Features => "bound",
        }
    }
}

/// What to provision
#[derive(Debug, Clone, Copy)]
pub struct PipelineRequest<'r> {
    /// Target workspace
    pub workspace: WorkspaceId,
    /// User who confirmed
    pub user: UserId,
    /// Confirmed selections
    pub selections: &'r Selections,
}

/// Forwards reconciler mutations to the sink as events of one stage
struct StageProgress<'s> {
    sink: &'s dyn ProgressSink,
    stage: Stage,
    done: usize,
    total: usize,
}

impl ReconcileObserver for StageProgress<'_> {
    fn mutation(&self, kind: EntityKind, name: &str, outcome: MutationOutcome) {
        self.sink.report(ProgressEvent {
            stage: self.stage,
            done: self.done,
            total: self.total,
            message: format!("{kind} `{name}` {outcome}"),
        });
    }
}

/// Borrowed context for one pipeline run
#[derive(Clone, Copy)]
pub struct Pipeline<'a> {
    platform: &'a dyn PlatformClient,
    throttle: &'a Throttle,
    catalog: &'a TemplateCatalog,
    associations: &'a dyn ClanAssociationStore,
}

impl<'a> Pipeline<'a> {
    /// Pipeline over the given collaborators
    #[must_use]
    pub fn new(
        platform: &'a dyn PlatformClient,
        throttle: &'a Throttle,
        catalog: &'a TemplateCatalog,
        associations: &'a dyn ClanAssociationStore,
    ) -> Self {
        Self {
            platform,
            throttle,
            catalog,
            associations,
        }
    }

    /// Run every stage for `request`
    ///
    /// Never fails as a whole; the summary carries each stage's status and
    /// errors. Created entities are also appended to the session log.
    #[tracing::instrument(skip_all, fields(workspace = %request.workspace, template = %request.selections.template))]
    pub async fn run(
        &self,
        request: PipelineRequest<'_>,
        session: &SessionHandle,
        sink: &dyn ProgressSink,
    ) -> ProvisionSummary {
        let selections = request.selections;
        let mut summary = ProvisionSummary::new(request.workspace, selections);
        let mut channels: Vec<ResolvedChannel> = Vec::new();
        let mut roles: Vec<ResolvedRole> = Vec::new();
        let total = Stage::ORDER.len();

        for (done, stage) in Stage::ORDER.into_iter().enumerate() {
            if session.is_cancelled() {
                tracing::info!(%stage, "session cancelled, skipping stage");
                summary.stages.push(StageOutcome::skipped(stage));
                continue;
            }
            sink.report(ProgressEvent {
                stage,
                done,
                total,
                message: format!("{stage} started"),
            });
            let observer = StageProgress {
                sink,
                stage,
                done,
                total,
            };
            let reconciler = Reconciler::new(self.platform, self.throttle, request.workspace)
                .with_observer(&observer);

            let (outcome, created) = match stage {
                Stage::Structure => self.structure(&reconciler, selections, &mut channels).await,
                Stage::Roles => self.roles(&reconciler, selections, &mut roles).await,
                Stage::Permissions => (
                    self.permissions(&reconciler, selections, &channels, &roles)
                        .await,
                    Vec::new(),
                ),
                Stage::Features => (
                    self.features(request, &channels, &mut summary).await,
                    Vec::new(),
                ),
            };

            if !created.is_empty() {
                session.lock().await.created.extend(created.iter().cloned());
                summary.created.extend(created);
            }
            sink.report(ProgressEvent {
                stage,
                done: done + 1,
                total,
                message: outcome.line(),
            });
            summary.stages.push(outcome);
        }

        tracing::info!(
            created = summary.created.len(),
            errors = summary.error_count(),
            "provisioning finished"
        );
        summary
    }

    async fn structure(
        &self,
        reconciler: &Reconciler<'_>,
        selections: &Selections,
        channels: &mut Vec<ResolvedChannel>,
    ) -> (StageOutcome, Vec<clanforge_reconcile::CreatedEntity>) {
        let template = match self.catalog.get(&selections.template) {
            Ok(template) => template,
            Err(e) => return (StageOutcome::failed(Stage::Structure, e.to_string()), Vec::new()),
        };
        let live = match fetch_graph(self.platform, reconciler.workspace()).await {
            Ok(live) => live,
            Err(e) => {
                return (
                    StageOutcome::failed(Stage::Structure, format!("listing failed: {e}")),
                    Vec::new(),
                )
            }
        };
        let report = reconciler.reconcile_structure(&template, &live).await;
        *channels = report.channels.clone();
        (StageOutcome::from_report(Stage::Structure, &report), report.created)
    }

    async fn roles(
        &self,
        reconciler: &Reconciler<'_>,
        selections: &Selections,
        roles: &mut Vec<ResolvedRole>,
    ) -> (StageOutcome, Vec<clanforge_reconcile::CreatedEntity>) {
        let specs = match selections.role_request().expand() {
            Ok(specs) => specs,
            Err(e) => return (StageOutcome::failed(Stage::Roles, e.to_string()), Vec::new()),
        };
        let live = match fetch_graph(self.platform, reconciler.workspace()).await {
            Ok(live) => live,
            Err(e) => {
                return (
                    StageOutcome::failed(Stage::Roles, format!("listing failed: {e}")),
                    Vec::new(),
                )
            }
        };
        let report = reconciler.reconcile_roles(&specs, &live).await;
        *roles = report.roles.clone();
        (StageOutcome::from_report(Stage::Roles, &report), report.created)
    }

    async fn permissions(
        &self,
        reconciler: &Reconciler<'_>,
        selections: &Selections,
        channels: &[ResolvedChannel],
        roles: &[ResolvedRole],
    ) -> StageOutcome {
        if channels.is_empty() {
            return StageOutcome::failed(Stage::Permissions, "no channels were resolved");
        }
        let live = match fetch_graph(self.platform, reconciler.workspace()).await {
            Ok(live) => live,
            Err(e) => return StageOutcome::failed(Stage::Permissions, format!("listing failed: {e}")),
        };
        let report = reconciler
            .reconcile_permissions(selections.policy, channels, roles, &live)
            .await;
        StageOutcome::from_report(Stage::Permissions, &report)
    }

    async fn features(
        &self,
        request: PipelineRequest<'_>,
        channels: &[ResolvedChannel],
        summary: &mut ProvisionSummary,
    ) -> StageOutcome {
        let selections = request.selections;
        let Some(clan_tag) = selections.clan_tag.clone() else {
            return StageOutcome::failed(Stage::Features, "no clan linked");
        };
        let (bindings, errors) = bind_features(&selections.features, channels);

        let previous = match self.associations.get(request.workspace).await {
            Ok(previous) => previous,
            Err(e) => return StageOutcome::failed(Stage::Features, e.to_string()),
        };
        let mut link = ClanLink {
            workspace_id: request.workspace,
            clan_tag,
            bindings,
            notifications: Feature::ALL
                .into_iter()
                .map(|f| (f, selections.features.contains(&f)))
                .collect(),
            linked_by: request.user,
            linked_at: Utc::now(),
        };
        if let Some(previous) = &previous {
            link.merge_previous(previous);
        }
        let bound = selections
            .features
            .iter()
            .filter(|f| link.binding(**f).is_some())
            .count();

        if let Err(e) = self.associations.put(link.clone()).await {
            return StageOutcome::failed(Stage::Features, e.to_string());
        }
        tracing::info!(clan = %link.clan_tag, bound, "clan linked");
        summary.link = Some(link);
        StageOutcome::completed(Stage::Features, bound, 0, errors)
    }
}

impl fmt::Debug for Pipeline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("templates", &self.catalog.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error() -> EntityError {
        EntityError::unresolved(clanforge_graph::EntityKind::Channel, "x", "missing")
    }

    #[test]
    fn status_from_counts() {
        assert_eq!(
            StageOutcome::completed(Stage::Roles, 4, 0, Vec::new()).status,
            StageStatus::Success
        );
        assert_eq!(
            StageOutcome::completed(Stage::Roles, 3, 0, vec![error()]).status,
            StageStatus::Partial
        );
        assert_eq!(
            StageOutcome::completed(Stage::Roles, 0, 0, vec![error()]).status,
            StageStatus::Failed
        );
    }

    #[test]
    fn outcome_lines() {
        let outcome = StageOutcome::completed(Stage::Structure, 17, 0, Vec::new());
        assert_eq!(outcome.line(), "Structure: success, 17 created, 0 already present");
        assert_eq!(StageOutcome::skipped(Stage::Features).line(), "Features: skipped");
        assert_eq!(
            StageOutcome::failed(Stage::Permissions, "no channels were resolved").line(),
            "Permissions: failed"
        );
    }
}
