//! Per-entity failures
//!
//! Reconciliation and restore never abort on a single failed entity. Each
//! failure becomes an [`EntityError`] row in the operation's report.

use crate::entity::EntityKind;
use crate::platform::PlatformError;
use serde::Serialize;

/// Category of a per-entity failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorClass {
    /// Remote call failed or was rate limited
    Transport,
    /// A parent or subject could not be resolved; the operation was skipped
    UnresolvedReference,
}

/// One failed entity operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind} `{name}`: {message}")]
pub struct EntityError {
    /// Kind of entity
    pub kind: EntityKind,
    /// Entity name or target description
    pub name: String,
    /// Failure class
    pub class: ErrorClass,
    /// Platform message
    pub message: String,
}

impl EntityError {
    /// Failure of a remote call
    #[must_use]
    pub fn transport(kind: EntityKind, name: impl Into<String>, error: &PlatformError) -> Self {
        Self {
            kind,
            name: name.into(),
            class: ErrorClass::Transport,
            message: error.to_string(),
        }
    }

    /// Dependent operation skipped for lack of a reference
    #[must_use]
    pub fn unresolved(kind: EntityKind, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            class: ErrorClass::UnresolvedReference,
            message: message.into(),
        }
    }
}
