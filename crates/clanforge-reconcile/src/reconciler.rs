//! Reconciliation context
//!
//! A [`Reconciler`] binds one workspace to the platform client and the
//! shared mutation throttle. It is cheap to build per operation; the
//! throttle it borrows is owned by the long-lived provisioning context so
//! every operation draws from the same request budget.

use crate::observe::{MutationOutcome, ReconcileObserver, NO_OBSERVER};
use clanforge_graph::{EntityKind, PlatformClient, Throttle, WorkspaceId};

/// Borrowed context for reconciling one workspace
#[derive(Clone, Copy)]
pub struct Reconciler<'a> {
    pub(crate) platform: &'a dyn PlatformClient,
    pub(crate) throttle: &'a Throttle,
    pub(crate) workspace: WorkspaceId,
    observer: &'a dyn ReconcileObserver,
}

impl<'a> Reconciler<'a> {
    /// Create reconciler
    #[inline]
    #[must_use]
    pub fn new(
        platform: &'a dyn PlatformClient,
        throttle: &'a Throttle,
        workspace: WorkspaceId,
    ) -> Self {
        Self {
            platform,
            throttle,
            workspace,
            observer: &NO_OBSERVER,
        }
    }

    /// With a receiver for per-mutation notifications
    #[inline]
    #[must_use]
    pub fn with_observer(mut self, observer: &'a dyn ReconcileObserver) -> Self {
        self.observer = observer;
        self
    }

    pub(crate) fn notify(&self, kind: EntityKind, name: &str, outcome: MutationOutcome) {
        self.observer.mutation(kind, name, outcome);
    }

    /// Workspace being reconciled
    #[inline]
    #[must_use]
    pub fn workspace(&self) -> WorkspaceId {
        self.workspace
    }
}

impl std::fmt::Debug for Reconciler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("workspace", &self.workspace)
            .field("delay", &self.throttle.delay())
            .finish_non_exhaustive()
    }
}
