//! Permission reconciliation
//!
//! For every resolved channel the desired overwrite of each subject class
//! is the policy's base grant refined by the classifier cascade. Classes
//! map to subjects through the resolved roles; a class with no resolved
//! role is skipped for that channel without affecting the others.

pub mod classifier;
pub mod policy;

pub use classifier::{classify, is_class, refine, ChannelClass, Classifier, CASCADE};
pub use policy::{base_grant, Grant, PermissionPolicy, SubjectClass};

use crate::observe::MutationOutcome;
use crate::reconciler::Reconciler;
use crate::report::{EditedOverwrite, EntityError, PermissionReport, ResolvedChannel, ResolvedRole};
use clanforge_catalog::{RoleSpec, Template};
use clanforge_graph::{EntityKind, LiveGraph, Overwrite, OverwriteSubject};
use serde::Serialize;

/// Non-empty grants for every subject class on a channel named `channel`
#[must_use]
pub fn class_grants(policy: PermissionPolicy, channel: &str) -> Vec<(SubjectClass, Grant)> {
    SubjectClass::ALL
        .into_iter()
        .map(|class| (class, refine(base_grant(policy, class), channel, class)))
        .filter(|(_, grant)| !grant.is_empty())
        .collect()
}

/// Dry-run of permission reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionPlan {
    /// Overwrites that would be set
    pub overwrites: usize,
    /// `(channel, class)` pairs with a grant but no role to carry it
    pub uncovered: Vec<(String, SubjectClass)>,
}

/// Count the overwrites a template would receive for a role set
#[must_use]
pub fn plan_permissions(
    policy: PermissionPolicy,
    template: &Template,
    roles: &[RoleSpec],
) -> PermissionPlan {
    let mut plan = PermissionPlan::default();
    for (_, channel) in template.channels() {
        for (class, _) in class_grants(policy, &channel.name) {
            let subjects = match class {
                SubjectClass::Everyone => 1,
                _ => roles.iter().filter(|r| SubjectClass::of(r) == class).count(),
            };
            if subjects == 0 {
                plan.uncovered.push((channel.name.clone(), class));
            }
            plan.overwrites += subjects;
        }
    }
    plan
}

fn subjects_for(class: SubjectClass, roles: &[ResolvedRole]) -> Vec<OverwriteSubject> {
    match class {
        SubjectClass::Everyone => vec![OverwriteSubject::Everyone],
        _ => roles
            .iter()
            .filter(|r| SubjectClass::of(&r.spec) == class)
            .map(|r| OverwriteSubject::Role(r.id))
            .collect(),
    }
}

impl Reconciler<'_> {
    /// Set the policy's overwrites on every resolved channel
    ///
    /// Overwrites already identical on the live channel are left alone, so a
    /// re-run against the resulting workspace issues no edits.
    #[tracing::instrument(skip_all, fields(workspace = %self.workspace, policy = %policy, channels = channels.len()))]
    pub async fn reconcile_permissions(
        &self,
        policy: PermissionPolicy,
        channels: &[ResolvedChannel],
        roles: &[ResolvedRole],
        live: &LiveGraph,
    ) -> PermissionReport {
        let mut report = PermissionReport::default();

        for channel in channels {
            let current = live.channels.iter().find(|c| c.id == channel.id);

            for (class, grant) in class_grants(policy, &channel.name) {
                let subjects = subjects_for(class, roles);
                if subjects.is_empty() {
                    tracing::debug!(channel = %channel.name, %class, "no role for subject class");
                    report
                        .skipped_subjects
                        .push((channel.name.clone(), class.to_string()));
                    continue;
                }

                for subject in subjects {
                    let overwrite = Overwrite::new(subject, grant.allow, grant.deny);
                    if current.and_then(|c| c.overwrite_for(subject)) == Some(&overwrite) {
                        report.unchanged += 1;
                        continue;
                    }

                    self.throttle.pace().await;
                    let target = format!("{} {subject}", channel.name);
                    match self
                        .platform
                        .edit_overwrite(self.workspace, channel.id, overwrite)
                        .await
                    {
                        Ok(()) => {
                            self.notify(EntityKind::Overwrite, &target, MutationOutcome::Edited);
                            report.edited.push(EditedOverwrite {
                                channel: channel.id,
                                subject,
                            });
                        }
                        Err(e) => {
                            tracing::warn!(channel = %channel.name, %subject, error = %e, "overwrite edit failed");
                            self.notify(EntityKind::Overwrite, &target, MutationOutcome::Failed);
                            report.errors.push(EntityError::transport(
                                EntityKind::Overwrite,
                                target,
                                &e,
                            ));
                        }
                    }
                }
            }
        }

        tracing::info!(
            edited = report.edited.len(),
            unchanged = report.unchanged,
            errors = report.errors.len(),
            "permissions reconciled"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clanforge_catalog::{builtin, position_role, tier_role, ClanPosition, RoleSetRequest};
    use clanforge_graph::Permissions;

    #[test]
    fn general_under_permissive() {
        let grants = class_grants(PermissionPolicy::PermissiveHierarchical, "general");
        let classes: Vec<_> = grants.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            classes,
            vec![
                SubjectClass::Everyone,
                SubjectClass::Leadership,
                SubjectClass::Elder,
                SubjectClass::Member,
                SubjectClass::Purpose,
            ]
        );
    }

    #[test]
    fn tiers_only_get_nothing() {
        let grants = class_grants(PermissionPolicy::OpenAccess, "general");
        assert!(grants.iter().all(|(c, _)| *c != SubjectClass::Tier));
    }

    #[test]
    fn announcements_read_only_for_everyone() {
        let grants = class_grants(PermissionPolicy::OpenAccess, "announcements");
        let (_, everyone) = grants
            .iter()
            .find(|(c, _)| *c == SubjectClass::Everyone)
            .unwrap();
        assert!(everyone.allow.contains(Permissions::VIEW_CHANNEL));
        assert!(everyone.deny.contains(Permissions::SEND_MESSAGES));
    }

    #[test]
    fn plan_counts_subjects_per_class() {
        let template = builtin::minimal();
        let roles = vec![
            position_role(ClanPosition::Leader),
            position_role(ClanPosition::CoLeader),
            tier_role(1).unwrap(),
        ];
        let plan = plan_permissions(PermissionPolicy::OpenAccess, &template, &roles);
        // everyone + two leadership roles on each of the 4 channels
        assert_eq!(plan.overwrites, 4 * 3);
        // announcements and war-log also patch elder/member/purpose, which have no roles
        assert_eq!(plan.uncovered.len(), 6);
        assert!(plan
            .uncovered
            .iter()
            .all(|(_, c)| !matches!(c, SubjectClass::Everyone | SubjectClass::Leadership)));
    }

    #[test]
    fn plan_without_roles_covers_everyone_only() {
        let template = builtin::minimal();
        let roles = RoleSetRequest::empty().expand().unwrap();
        let plan = plan_permissions(PermissionPolicy::OpenAccess, &template, &roles);
        assert_eq!(plan.overwrites, 4);
        assert!(plan
            .uncovered
            .iter()
            .any(|(ch, c)| ch == "general" && *c == SubjectClass::Leadership));
    }
}
