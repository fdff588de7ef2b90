//! Per-mutation notifications
//!
//! Reconcilers report every remote mutation they attempt to a
//! [`ReconcileObserver`], in issue order. Matched entities issue no call
//! and are not reported.

use clanforge_graph::EntityKind;
use std::fmt;

/// Result of one remote mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Entity created
    Created,
    /// Overwrite edited
    Edited,
    /// The call failed; the failure is also in the report
    Failed,
}

impl fmt::Display for MutationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Edited => "edited",
            Self::Failed => "failed",
        })
    }
}

/// Receiver of per-mutation notifications
///
/// Called inline between throttled calls; implementations must not block.
pub trait ReconcileObserver: Send + Sync {
    /// One mutation on `name` finished with `outcome`
    fn mutation(&self, kind: EntityKind, name: &str, outcome: MutationOutcome);
}

/// Ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObserver;

impl ReconcileObserver for NoObserver {
    fn mutation(&self, _kind: EntityKind, _name: &str, _outcome: MutationOutcome) {}
}

pub(crate) static NO_OBSERVER: NoObserver = NoObserver;
