//! Error types for clanforge core
//!
//! Operation-level failures only. Per-entity failures of reconciliation and
//! restore are rows in the returned reports, never errors here.

use clanforge_catalog::CatalogError;
use clanforge_graph::PlatformError;
use clanforge_snapshot::SnapshotError;
use clanforge_wizard::SessionError;

/// Main clanforge error type
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Unknown or invalid template
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Snapshot missing, unreadable or refused
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Rejected wizard interaction
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Workspace could not be read
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl ProvisionError {
    /// Invalid configuration
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if the operation was aborted before any remote call
    ///
    /// Unknown templates, missing snapshots and bad configuration.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Config(_) | Self::Catalog(_) => true,
            Self::Snapshot(e) => !matches!(e, SnapshotError::Platform(_)),
            Self::Session(_) | Self::Platform(_) => false,
        }
    }

    /// Check if this is a rejected wizard interaction
    #[inline]
    #[must_use]
    pub fn is_session(&self) -> bool {
        matches!(self, Self::Session(_))
    }

    /// Check if retrying later may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Platform(e) | Self::Snapshot(SnapshotError::Platform(e)) => e.is_transient(),
            _ => false,
        }
    }
}
