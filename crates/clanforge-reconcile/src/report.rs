//! Reconciliation reports
//!
//! Reconcilers never fail as a whole. They return a report listing what
//! was created, what was already present, and every per-entity error, plus
//! the resolved identifiers downstream stages need.

use clanforge_catalog::RoleSpec;
use clanforge_graph::{ChannelKind, EntityId, EntityKind, OverwriteSubject};
use serde::Serialize;

pub use clanforge_graph::{EntityError, ErrorClass};

/// An entity created during this run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedEntity {
    /// Kind of entity
    pub kind: EntityKind,
    /// Id assigned by the platform
    pub id: EntityId,
    /// Name it was created with
    pub name: String,
    /// Parent category for channels
    pub parent: Option<EntityId>,
}

/// A desired entity that already existed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntity {
    /// Kind of entity
    pub kind: EntityKind,
    /// Desired name
    pub name: String,
    /// Id of the live entity that matched
    pub existing: EntityId,
}

/// Template category resolved to a live id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCategory {
    /// Template name
    pub name: String,
    /// Live id
    pub id: EntityId,
}

/// Template channel resolved to a live id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedChannel {
    /// Template name
    pub name: String,
    /// Text or voice
    pub kind: ChannelKind,
    /// Live id
    pub id: EntityId,
    /// Live parent category
    pub parent: Option<EntityId>,
}

/// Role spec resolved to a live id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRole {
    /// Desired role
    pub spec: RoleSpec,
    /// Live id
    pub id: EntityId,
}

/// Common view over reconciliation results
pub trait ReconcileOutcome {
    /// Entities created or edited
    fn affected(&self) -> usize;

    /// Per-entity failures
    fn errors(&self) -> &[EntityError];

    /// Desired entities already in place
    fn already_present(&self) -> usize;
}

/// Output of structure reconciliation
#[derive(Debug, Clone, Default, Serialize)]
pub struct StructureReport {
    /// Entities created
    pub created: Vec<CreatedEntity>,
    /// Entities already present
    pub skipped: Vec<SkippedEntity>,
    /// Per-entity failures
    pub errors: Vec<EntityError>,
    /// Every template category that has a live id
    pub categories: Vec<ResolvedCategory>,
    /// Every template channel that has a live id
    pub channels: Vec<ResolvedChannel>,
}

impl ReconcileOutcome for StructureReport {
    fn affected(&self) -> usize {
        self.created.len()
    }

    fn errors(&self) -> &[EntityError] {
        &self.errors
    }

    fn already_present(&self) -> usize {
        self.skipped.len()
    }
}

/// Output of role reconciliation
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoleReport {
    /// Roles created
    pub created: Vec<CreatedEntity>,
    /// Roles already present
    pub skipped: Vec<SkippedEntity>,
    /// Per-role failures
    pub errors: Vec<EntityError>,
    /// Every role spec that has a live id
    pub roles: Vec<ResolvedRole>,
}

impl RoleReport {
    /// Id of the resolved role with this spec name
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<EntityId> {
        self.roles.iter().find(|r| r.spec.name == name).map(|r| r.id)
    }
}

impl ReconcileOutcome for RoleReport {
    fn affected(&self) -> usize {
        self.created.len()
    }

    fn errors(&self) -> &[EntityError] {
        &self.errors
    }

    fn already_present(&self) -> usize {
        self.skipped.len()
    }
}

/// An overwrite edit that was submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EditedOverwrite {
    /// Channel edited
    pub channel: EntityId,
    /// Role or member the overwrite applies to
    pub subject: OverwriteSubject,
}

/// Output of permission reconciliation
#[derive(Debug, Clone, Default, Serialize)]
pub struct PermissionReport {
    /// Overwrite edits submitted
    pub edited: Vec<EditedOverwrite>,
    /// Overwrites already identical on the live channel
    pub unchanged: usize,
    /// Subject classes with no resolved role, per channel
    pub skipped_subjects: Vec<(String, String)>,
    /// Per-overwrite failures
    pub errors: Vec<EntityError>,
}

impl ReconcileOutcome for PermissionReport {
    fn affected(&self) -> usize {
        self.edited.len()
    }

    fn errors(&self) -> &[EntityError] {
        &self.errors
    }

    fn already_present(&self) -> usize {
        self.unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_counts() {
        let report = StructureReport {
            skipped: vec![SkippedEntity {
                kind: EntityKind::Category,
                name: "Info".into(),
                existing: EntityId(1),
            }],
            ..StructureReport::default()
        };
        assert_eq!(report.affected(), 0);
        assert_eq!(report.already_present(), 1);
    }
}
