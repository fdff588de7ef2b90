//! Final provisioning summary

use crate::association::ClanLink;
use crate::pipeline::{Stage, StageOutcome, StageStatus};
use crate::selections::Selections;
use clanforge_graph::WorkspaceId;
use clanforge_reconcile::CreatedEntity;
use serde::Serialize;
use std::fmt::Write as _;

/// Everything a confirmed wizard run did
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionSummary {
    /// Target workspace
    pub workspace: WorkspaceId,
    /// Linked clan tag
    pub clan_tag: Option<String>,
    /// Template provisioned
    pub template: String,
    /// Outcome per stage in run order
    pub stages: Vec<StageOutcome>,
    /// Every entity created
    pub created: Vec<CreatedEntity>,
    /// Clan link written by the features stage
    pub link: Option<ClanLink>,
}

impl ProvisionSummary {
    pub(crate) fn new(workspace: WorkspaceId, selections: &Selections) -> Self {
        Self {
            workspace,
            clan_tag: selections.clan_tag.clone(),
            template: selections.template.clone(),
            stages: Vec::new(),
            created: Vec::new(),
            link: None,
        }
    }

    /// Outcome of `stage`
    #[must_use]
    pub fn stage(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Outstanding errors, prefixed with their stage
    pub fn errors(&self) -> impl Iterator<Item = String> + '_ {
        self.stages.iter().flat_map(|s| {
            s.failure
                .iter()
                .map(move |f| format!("{}: {f}", s.stage))
                .chain(s.errors.iter().map(move |e| format!("{}: {e}", s.stage)))
        })
    }

    /// Outstanding errors across all stages
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.stages
            .iter()
            .map(|s| s.errors.len() + usize::from(s.failure.is_some()))
            .sum()
    }

    /// Whether every stage succeeded
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.stages.iter().all(|s| s.status == StageStatus::Success)
    }

    /// Human-readable summary listing at most `limit` errors
    #[must_use]
    pub fn render(&self, limit: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Setup for {} using `{}`",
            self.clan_tag.as_deref().unwrap_or("(no clan)"),
            self.template
        );
        for stage in &self.stages {
            let _ = writeln!(out, "{}", stage.line());
        }

        let total = self.error_count();
        if total > 0 {
            let _ = writeln!(out, "Outstanding errors:");
            for error in self.errors().take(limit) {
                let _ = writeln!(out, "- {error}");
            }
            if total > limit {
                let _ = writeln!(out, "... and {} more", total - limit);
            }
        }
        out
    }
}
