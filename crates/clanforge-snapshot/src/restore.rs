//! Restore engine
//!
//! Replays a snapshot against the live workspace it was taken from.
//! Platform ids are never reused, so every entity that has to be recreated
//! gets a new id; the engine keeps an old -> new map and rewrites channel
//! parents and overwrite subjects through it.
//!
//! # Order
//! 1. Roles, highest hierarchy position first
//! 2. Categories by ascending position, then their overwrites
//! 3. Channels by ascending position, then their overwrites
//!
//! Entities present in the workspace but absent from the snapshot are left
//! untouched.
//!
//! The id map is one-to-one. A live entity is matched by id first; the name
//! fallback only considers live entities that no snapshot record owns by id
//! and that no earlier record has already claimed.

use crate::error::SnapshotError;
use crate::model::{CategoryRecord, ChannelRecord, OverwriteRecord, RoleRecord, Snapshot};
use clanforge_graph::{
    fetch_graph, names_match, EntityError, EntityId, EntityKind, LiveChannel, LiveGraph, NewCategory,
    NewChannel, NewRole, Overwrite, OverwriteSubject, Permissions, PlatformClient, Throttle,
    WorkspaceId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What to do with an overwrite whose role is not in the id map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnmappedSubjectPolicy {
    /// Skip the overwrite and record an unresolved-reference error
    #[default]
    Drop,
    /// Submit the overwrite with the snapshot's role id unchanged
    KeepOriginal,
}

/// Outcome of a restore
#[derive(Debug, Clone, Default, Serialize)]
pub struct RestoreReport {
    /// Roles created
    pub roles_restored: usize,
    /// Categories and channels created
    pub channels_restored: usize,
    /// Overwrite edits submitted successfully
    pub overwrites_applied: usize,
    /// Per-entity failures
    pub errors: Vec<EntityError>,
    /// Snapshot id -> live id for every matched or created entity
    pub id_map: BTreeMap<EntityId, EntityId>,
}

impl RestoreReport {
    /// Entities created
    #[must_use]
    pub fn created(&self) -> usize {
        self.roles_restored + self.channels_restored
    }
}

/// Borrowed restore context
#[derive(Clone, Copy)]
pub struct RestoreEngine<'a> {
    platform: &'a dyn PlatformClient,
    throttle: &'a Throttle,
    unmapped: UnmappedSubjectPolicy,
}

impl std::fmt::Debug for RestoreEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestoreEngine")
            .field("unmapped", &self.unmapped)
            .finish_non_exhaustive()
    }
}

struct Run {
    live: LiveGraph,
    /// Snapshot ids; each is reserved for its own record
    reserved: BTreeSet<EntityId>,
    /// Live ids already mapped to
    claimed: BTreeSet<EntityId>,
    report: RestoreReport,
}

impl Run {
    fn new(live: LiveGraph, snapshot: &Snapshot) -> Self {
        let reserved = snapshot
            .roles
            .iter()
            .map(|r| r.id)
            .chain(snapshot.categories.iter().map(|c| c.id))
            .chain(snapshot.channels.iter().map(|c| c.id))
            .collect();
        Self {
            live,
            reserved,
            claimed: BTreeSet::new(),
            report: RestoreReport::default(),
        }
    }

    fn map(&mut self, old: EntityId, new: EntityId) {
        self.report.id_map.insert(old, new);
        self.claimed.insert(new);
    }

    fn mapped(&self, old: EntityId) -> Option<EntityId> {
        self.report.id_map.get(&old).copied()
    }

    /// Whether a live entity may be matched by name
    fn unclaimed(&self, live: EntityId) -> bool {
        !self.reserved.contains(&live) && !self.claimed.contains(&live)
    }
}

impl<'a> RestoreEngine<'a> {
    /// Engine over `platform`, pacing mutations with `throttle`
    #[must_use]
    pub fn new(platform: &'a dyn PlatformClient, throttle: &'a Throttle) -> Self {
        Self {
            platform,
            throttle,
            unmapped: UnmappedSubjectPolicy::default(),
        }
    }

    /// With unmapped-subject policy
    #[inline]
    #[must_use]
    pub fn with_unmapped_subjects(mut self, policy: UnmappedSubjectPolicy) -> Self {
        self.unmapped = policy;
        self
    }

    /// Restore `snapshot` into `workspace`
    ///
    /// # Errors
    /// `WorkspaceMismatch` before any remote call if the snapshot belongs
    /// to another workspace; `Platform` if the live graph cannot be listed.
    /// Per-entity failures are reported in [`RestoreReport::errors`].
    #[tracing::instrument(skip_all, fields(workspace = %workspace, snapshot = %snapshot.snapshot_id))]
    pub async fn restore(
        &self,
        workspace: WorkspaceId,
        snapshot: &Snapshot,
    ) -> Result<RestoreReport, SnapshotError> {
        if snapshot.workspace_id != workspace {
            tracing::warn!(owner = %snapshot.workspace_id, "refusing cross-workspace restore");
            return Err(SnapshotError::WorkspaceMismatch {
                requested: workspace,
                snapshot: snapshot.workspace_id,
            });
        }

        let mut run = Run::new(fetch_graph(self.platform, workspace).await?, snapshot);

        let mut roles: Vec<&RoleRecord> = snapshot.roles.iter().collect();
        roles.sort_by(|a, b| b.position.cmp(&a.position));
        for role in roles {
            self.restore_role(workspace, role, &mut run).await;
        }

        let mut categories: Vec<&CategoryRecord> = snapshot.categories.iter().collect();
        categories.sort_by_key(|c| c.position);
        for category in categories {
            self.restore_category(workspace, category, &mut run).await;
        }

        let mut channels: Vec<&ChannelRecord> = snapshot.channels.iter().collect();
        channels.sort_by_key(|c| c.position);
        for channel in channels {
            self.restore_channel(workspace, channel, &mut run).await;
        }

        let report = run.report;
        tracing::info!(
            roles = report.roles_restored,
            channels = report.channels_restored,
            overwrites = report.overwrites_applied,
            errors = report.errors.len(),
            "restore finished"
        );
        Ok(report)
    }

    async fn restore_role(&self, workspace: WorkspaceId, record: &RoleRecord, run: &mut Run) {
        let roles = || run.live.roles.iter().filter(|r| !r.is_default);
        let existing = roles()
            .find(|r| r.id == record.id)
            .or_else(|| {
                roles().find(|r| run.unclaimed(r.id) && names_match(&r.name, &record.name, &[]))
            })
            .map(|r| r.id);
        if let Some(id) = existing {
            run.map(record.id, id);
            return;
        }

        self.throttle.pace().await;
        let request = NewRole {
            name: record.name.clone(),
            color: record.color,
            permissions: Permissions::from_bits_retain(record.permissions),
            hoist: record.hoist,
            mentionable: record.mentionable,
        };
        match self.platform.create_role(workspace, request).await {
            Ok(created) => {
                tracing::debug!(role = %record.name, old = %record.id, new = %created.id, "restored role");
                run.map(record.id, created.id);
                run.report.roles_restored += 1;
            }
            Err(e) => {
                tracing::warn!(role = %record.name, error = %e, "role restore failed");
                run.report
                    .errors
                    .push(EntityError::transport(EntityKind::Role, &record.name, &e));
            }
        }
    }

    async fn restore_category(&self, workspace: WorkspaceId, record: &CategoryRecord, run: &mut Run) {
        let categories = &run.live.categories;
        let existing = categories
            .iter()
            .find(|c| c.id == record.id)
            .or_else(|| {
                categories
                    .iter()
                    .find(|c| run.unclaimed(c.id) && names_match(&c.name, &record.name, &[]))
            })
            .map(|c| (c.id, c.overwrites.clone()));

        let (id, current) = match existing {
            Some(found) => found,
            None => {
                self.throttle.pace().await;
                let request = NewCategory {
                    name: record.name.clone(),
                    position: Some(record.position),
                    overwrites: Vec::new(),
                };
                match self.platform.create_category(workspace, request).await {
                    Ok(created) => {
                        tracing::debug!(category = %record.name, new = %created.id, "restored category");
                        run.report.channels_restored += 1;
                        (created.id, Vec::new())
                    }
                    Err(e) => {
                        tracing::warn!(category = %record.name, error = %e, "category restore failed");
                        run.report.errors.push(EntityError::transport(
                            EntityKind::Category,
                            &record.name,
                            &e,
                        ));
                        return;
                    }
                }
            }
        };

        run.map(record.id, id);
        self.apply_overwrites(workspace, id, &record.name, &record.overwrites, &current, run)
            .await;
    }

    async fn restore_channel(&self, workspace: WorkspaceId, record: &ChannelRecord, run: &mut Run) {
        let parent = record.parent.and_then(|old| run.mapped(old));
        if record.parent.is_some() && parent.is_none() {
            tracing::debug!(channel = %record.name, "parent not restored, channel goes top-level");
        }

        let existing = run
            .live
            .channels
            .iter()
            .find(|c| c.id == record.id)
            .or_else(|| {
                let candidates: Vec<&LiveChannel> = run
                    .live
                    .channels
                    .iter()
                    .filter(|c| {
                        c.kind == record.kind
                            && run.unclaimed(c.id)
                            && names_match(&c.name, &record.name, &[])
                    })
                    .collect();
                candidates
                    .iter()
                    .find(|c| c.parent == parent)
                    .or_else(|| candidates.first())
                    .copied()
            })
            .map(|c| (c.id, c.overwrites.clone()));

        let (id, current) = match existing {
            Some(found) => found,
            None => {
                self.throttle.pace().await;
                let request = NewChannel {
                    name: record.name.clone(),
                    kind: record.kind,
                    topic: record.topic.clone(),
                    parent,
                    position: Some(record.position),
                };
                match self.platform.create_channel(workspace, request).await {
                    Ok(created) => {
                        tracing::debug!(channel = %record.name, new = %created.id, "restored channel");
                        run.report.channels_restored += 1;
                        (created.id, Vec::new())
                    }
                    Err(e) => {
                        tracing::warn!(channel = %record.name, error = %e, "channel restore failed");
                        run.report.errors.push(EntityError::transport(
                            EntityKind::Channel,
                            &record.name,
                            &e,
                        ));
                        return;
                    }
                }
            }
        };

        run.map(record.id, id);
        self.apply_overwrites(workspace, id, &record.name, &record.overwrites, &current, run)
            .await;
    }

    fn translate(&self, subject: OverwriteSubject, run: &Run) -> Option<OverwriteSubject> {
        match subject {
            OverwriteSubject::Everyone => Some(OverwriteSubject::Everyone),
            OverwriteSubject::Role(old) => match (run.mapped(old), self.unmapped) {
                (Some(new), _) => Some(OverwriteSubject::Role(new)),
                (None, UnmappedSubjectPolicy::KeepOriginal) => Some(subject),
                (None, UnmappedSubjectPolicy::Drop) => None,
            },
        }
    }

    async fn apply_overwrites(
        &self,
        workspace: WorkspaceId,
        target: EntityId,
        target_name: &str,
        stored: &[OverwriteRecord],
        current: &[Overwrite],
        run: &mut Run,
    ) {
        for record in stored {
            let Some(subject) = self.translate(record.subject, run) else {
                run.report.errors.push(EntityError::unresolved(
                    EntityKind::Overwrite,
                    target_name,
                    format!("subject {} was not restored", record.subject),
                ));
                continue;
            };
            let overwrite = record.to_overwrite(subject);
            if current.contains(&overwrite) {
                continue;
            }

            self.throttle.pace().await;
            match self
                .platform
                .edit_overwrite(workspace, target, overwrite)
                .await
            {
                Ok(()) => run.report.overwrites_applied += 1,
                Err(e) => {
                    tracing::warn!(entity = %target_name, %subject, error = %e, "overwrite restore failed");
                    run.report.errors.push(EntityError::transport(
                        EntityKind::Overwrite,
                        format!("{target_name} {subject}"),
                        &e,
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SnapshotId;
    use chrono::Utc;
    use clanforge_graph::SimulatedPlatform;

    fn empty_snapshot(workspace: WorkspaceId) -> Snapshot {
        Snapshot {
            format_version: 1,
            snapshot_id: SnapshotId::generate(),
            workspace_id: workspace,
            created_at: Utc::now(),
            categories: Vec::new(),
            channels: Vec::new(),
            roles: Vec::new(),
        }
    }

    #[tokio::test]
    async fn cross_workspace_makes_no_calls() {
        let sim = SimulatedPlatform::new();
        sim.seed_workspace(WorkspaceId(1));
        let throttle = Throttle::unthrottled();

        let err = RestoreEngine::new(&sim, &throttle)
            .restore(WorkspaceId(1), &empty_snapshot(WorkspaceId(2)))
            .await
            .unwrap_err();
        assert!(matches!(err, SnapshotError::WorkspaceMismatch { .. }));
        assert!(sim.calls().is_empty());
    }

    #[test]
    fn everyone_always_maps_to_everyone() {
        let sim = SimulatedPlatform::new();
        let throttle = Throttle::unthrottled();
        let engine = RestoreEngine::new(&sim, &throttle);
        let run = Run::new(LiveGraph::default(), &empty_snapshot(WorkspaceId(1)));
        assert_eq!(
            engine.translate(OverwriteSubject::Everyone, &run),
            Some(OverwriteSubject::Everyone)
        );
        assert_eq!(engine.translate(OverwriteSubject::Role(EntityId(5)), &run), None);
        assert_eq!(
            engine
                .with_unmapped_subjects(UnmappedSubjectPolicy::KeepOriginal)
                .translate(OverwriteSubject::Role(EntityId(5)), &run),
            Some(OverwriteSubject::Role(EntityId(5)))
        );
    }
}
