//! Session errors
//!
//! Every variant rejects the interaction before any state change or remote
//! call.

use crate::step::WizardStep;
use clanforge_graph::{UserId, WorkspaceId};

/// Rejected wizard interaction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No wizard running for the workspace
    #[error("no active setup session for workspace {0}")]
    NoActiveSession(WorkspaceId),

    /// A wizard is already running for the workspace
    #[error("a setup session is already active for workspace {0}")]
    AlreadyActive(WorkspaceId),

    /// Interaction from someone other than the initiating user
    #[error("session for workspace {workspace} belongs to another user (not {user})")]
    NotOwner { workspace: WorkspaceId, user: UserId },

    /// Action not available at the current step
    #[error("`{action}` is not available at step {step}")]
    InvalidTransition { step: WizardStep, action: String },

    /// Input rejected by validation
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl SessionError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Whether the error concerns who is interacting, not what they sent
    #[inline]
    #[must_use]
    pub fn is_access_error(&self) -> bool {
        matches!(self, Self::NoActiveSession(_) | Self::NotOwner { .. })
    }
}
