//! Structure reconciliation
//!
//! Creates the categories and channels of a template that are missing from
//! the live workspace. Existing entities are matched by normalized name or
//! alias and never renamed, moved or deleted.
//!
//! # Ordering
//! Each category is resolved (matched or created) before any of its
//! channels; a channel whose category could not be resolved is skipped with
//! an unresolved-reference error.

use crate::observe::MutationOutcome;
use crate::reconciler::Reconciler;
use crate::report::{
    CreatedEntity, EntityError, ResolvedCategory, ResolvedChannel, SkippedEntity, StructureReport,
};
use clanforge_catalog::{CategorySpec, ChannelSpec, Template};
use clanforge_graph::{
    names_match, EntityId, EntityKind, LiveCategory, LiveChannel, LiveGraph, NewCategory,
    NewChannel,
};
use serde::Serialize;

/// Dry-run result for a template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructurePlan {
    /// Category names that would be created
    pub categories: Vec<String>,
    /// `(category, channel)` names that would be created
    pub channels: Vec<(String, String)>,
    /// Desired entities already present
    pub present: usize,
}

impl StructurePlan {
    /// Total entities that would be created
    #[must_use]
    pub fn to_create(&self) -> usize {
        self.categories.len() + self.channels.len()
    }
}

pub(crate) fn match_category<'g>(live: &'g LiveGraph, spec: &CategorySpec) -> Option<&'g LiveCategory> {
    live.categories
        .iter()
        .find(|c| names_match(&c.name, &spec.name, &spec.aliases))
}

/// Find a live channel for `spec`, preferring one under `parent`
pub(crate) fn match_channel<'g>(
    live: &'g LiveGraph,
    spec: &ChannelSpec,
    parent: Option<EntityId>,
) -> Option<&'g LiveChannel> {
    let mut candidates = live
        .channels
        .iter()
        .filter(|c| c.kind == spec.kind && names_match(&c.name, &spec.name, &spec.aliases));
    let first = candidates.next()?;
    if parent.is_none() || first.parent == parent {
        return Some(first);
    }
    Some(candidates.find(|c| c.parent == parent).unwrap_or(first))
}

/// Compute which template entities are missing, without remote calls
#[must_use]
pub fn plan_structure(template: &Template, live: &LiveGraph) -> StructurePlan {
    let mut plan = StructurePlan::default();
    for category in &template.categories {
        let parent = match match_category(live, category) {
            Some(existing) => {
                plan.present += 1;
                Some(existing.id)
            }
            None => {
                plan.categories.push(category.name.clone());
                None
            }
        };
        for channel in &category.channels {
            if match_channel(live, channel, parent).is_some() {
                plan.present += 1;
            } else {
                plan.channels
                    .push((category.name.clone(), channel.name.clone()));
            }
        }
    }
    plan
}

impl Reconciler<'_> {
    /// Create the template's missing categories and channels
    ///
    /// Best effort: every per-entity failure lands in `errors` and the
    /// remaining entities are still processed.
    #[tracing::instrument(skip_all, fields(workspace = %self.workspace, template = %template.name))]
    pub async fn reconcile_structure(&self, template: &Template, live: &LiveGraph) -> StructureReport {
        let mut report = StructureReport::default();

        for category in &template.categories {
            let parent = self.resolve_category(category, live, &mut report).await;

            for channel in &category.channels {
                let Some(parent_id) = parent else {
                    report.errors.push(EntityError::unresolved(
                        EntityKind::Channel,
                        &channel.name,
                        format!("parent category `{}` is unavailable", category.name),
                    ));
                    continue;
                };
                self.resolve_channel(channel, parent_id, live, &mut report)
                    .await;
            }
        }

        tracing::info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            errors = report.errors.len(),
            "structure reconciled"
        );
        report
    }

    async fn resolve_category(
        &self,
        spec: &CategorySpec,
        live: &LiveGraph,
        report: &mut StructureReport,
    ) -> Option<EntityId> {
        if let Some(existing) = match_category(live, spec) {
            report.skipped.push(SkippedEntity {
                kind: EntityKind::Category,
                name: spec.name.clone(),
                existing: existing.id,
            });
            report.categories.push(ResolvedCategory {
                name: spec.name.clone(),
                id: existing.id,
            });
            return Some(existing.id);
        }

        self.throttle.pace().await;
        match self
            .platform
            .create_category(self.workspace, NewCategory::named(&spec.name))
            .await
        {
            Ok(created) => {
                tracing::debug!(category = %spec.name, id = %created.id, "created category");
                self.notify(EntityKind::Category, &spec.name, MutationOutcome::Created);
                report.created.push(CreatedEntity {
                    kind: EntityKind::Category,
                    id: created.id,
                    name: created.name,
                    parent: None,
                });
                report.categories.push(ResolvedCategory {
                    name: spec.name.clone(),
                    id: created.id,
                });
                Some(created.id)
            }
            Err(e) => {
                tracing::warn!(category = %spec.name, error = %e, "category creation failed");
                self.notify(EntityKind::Category, &spec.name, MutationOutcome::Failed);
                report
                    .errors
                    .push(EntityError::transport(EntityKind::Category, &spec.name, &e));
                None
            }
        }
    }

    async fn resolve_channel(
        &self,
        spec: &ChannelSpec,
        parent: EntityId,
        live: &LiveGraph,
        report: &mut StructureReport,
    ) {
        if let Some(existing) = match_channel(live, spec, Some(parent)) {
            report.skipped.push(SkippedEntity {
                kind: EntityKind::Channel,
                name: spec.name.clone(),
                existing: existing.id,
            });
            report.channels.push(ResolvedChannel {
                name: spec.name.clone(),
                kind: spec.kind,
                id: existing.id,
                parent: existing.parent,
            });
            return;
        }

        self.throttle.pace().await;
        let request = NewChannel {
            name: spec.name.clone(),
            kind: spec.kind,
            topic: spec.topic.clone(),
            parent: Some(parent),
            position: None,
        };
        match self.platform.create_channel(self.workspace, request).await {
            Ok(created) => {
                tracing::debug!(channel = %spec.name, id = %created.id, "created channel");
                self.notify(EntityKind::Channel, &spec.name, MutationOutcome::Created);
                report.created.push(CreatedEntity {
                    kind: EntityKind::Channel,
                    id: created.id,
                    name: created.name,
                    parent: Some(parent),
                });
                report.channels.push(ResolvedChannel {
                    name: spec.name.clone(),
                    kind: spec.kind,
                    id: created.id,
                    parent: Some(parent),
                });
            }
            Err(e) => {
                tracing::warn!(channel = %spec.name, error = %e, "channel creation failed");
                self.notify(EntityKind::Channel, &spec.name, MutationOutcome::Failed);
                report
                    .errors
                    .push(EntityError::transport(EntityKind::Channel, &spec.name, &e));
            }
        }
    }
}
