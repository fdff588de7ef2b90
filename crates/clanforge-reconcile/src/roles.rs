//! Role reconciliation

use crate::observe::MutationOutcome;
use crate::reconciler::Reconciler;
use crate::report::{CreatedEntity, EntityError, ResolvedRole, RoleReport, SkippedEntity};
use clanforge_catalog::RoleSpec;
use clanforge_graph::{names_match, EntityKind, LiveGraph, LiveRole};

pub(crate) fn match_role<'g>(live: &'g LiveGraph, spec: &RoleSpec) -> Option<&'g LiveRole> {
    live.roles
        .iter()
        .filter(|r| !r.is_default)
        .find(|r| names_match(&r.name, &spec.name, &spec.aliases))
}

/// Role specs that have no live counterpart
#[must_use]
pub fn plan_roles<'s>(roles: &'s [RoleSpec], live: &LiveGraph) -> Vec<&'s RoleSpec> {
    roles
        .iter()
        .filter(|spec| match_role(live, spec).is_none())
        .collect()
}

impl Reconciler<'_> {
    /// Create missing roles, in the given (hierarchy) order
    #[tracing::instrument(skip_all, fields(workspace = %self.workspace, roles = roles.len()))]
    pub async fn reconcile_roles(&self, roles: &[RoleSpec], live: &LiveGraph) -> RoleReport {
        let mut report = RoleReport::default();

        for spec in roles {
            if let Some(existing) = match_role(live, spec) {
                report.skipped.push(SkippedEntity {
                    kind: EntityKind::Role,
                    name: spec.name.clone(),
                    existing: existing.id,
                });
                report.roles.push(ResolvedRole {
                    spec: spec.clone(),
                    id: existing.id,
                });
                continue;
            }

            self.throttle.pace().await;
            match self
                .platform
                .create_role(self.workspace, spec.to_new_role())
                .await
            {
                Ok(created) => {
                    tracing::debug!(role = %spec.name, id = %created.id, "created role");
                    self.notify(EntityKind::Role, &spec.name, MutationOutcome::Created);
                    report.created.push(CreatedEntity {
                        kind: EntityKind::Role,
                        id: created.id,
                        name: created.name,
                        parent: None,
                    });
                    report.roles.push(ResolvedRole {
                        spec: spec.clone(),
                        id: created.id,
                    });
                }
                Err(e) => {
                    tracing::warn!(role = %spec.name, error = %e, "role creation failed");
                    self.notify(EntityKind::Role, &spec.name, MutationOutcome::Failed);
                    report
                        .errors
                        .push(EntityError::transport(EntityKind::Role, &spec.name, &e));
                }
            }
        }

        tracing::info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            errors = report.errors.len(),
            "roles reconciled"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clanforge_catalog::{position_role, ClanPosition};
    use clanforge_graph::{EntityId, Permissions};

    fn live_role(id: u64, name: &str, is_default: bool) -> LiveRole {
        LiveRole {
            id: EntityId(id),
            name: name.to_string(),
            color: 0,
            permissions: Permissions::empty(),
            position: 1,
            hoist: false,
            mentionable: false,
            is_default,
        }
    }

    #[test]
    fn alias_counts_as_present() {
        let live = LiveGraph {
            roles: vec![live_role(1, "👑 Co Leader", false), live_role(2, "vice-leader", false)],
            ..LiveGraph::default()
        };
        let spec = position_role(ClanPosition::CoLeader);
        assert_eq!(match_role(&live, &spec).unwrap().id, EntityId(1));
    }

    #[test]
    fn default_role_never_matches() {
        let live = LiveGraph {
            roles: vec![live_role(1, "Member", true)],
            ..LiveGraph::default()
        };
        let spec = position_role(ClanPosition::Member);
        assert!(match_role(&live, &spec).is_none());
    }

    #[test]
    fn plan_lists_missing_only() {
        let live = LiveGraph {
            roles: vec![live_role(1, "leader", false)],
            ..LiveGraph::default()
        };
        let specs = vec![
            position_role(ClanPosition::Leader),
            position_role(ClanPosition::Elder),
        ];
        let missing = plan_roles(&specs, &live);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].name, "Elder");
    }
}
