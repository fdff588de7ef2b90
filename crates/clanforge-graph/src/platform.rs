//! Platform client seam
//!
//! The transport to the remote platform (HTTP, gateway, authentication) is
//! outside this workspace. Everything that reads or mutates a live
//! workspace goes through [`PlatformClient`]; each call is bounded by the
//! client's own timeout.

use crate::entity::{
    LiveCategory, LiveChannel, LiveGraph, LiveRole, NewCategory, NewChannel, NewRole, Overwrite,
};
use crate::ids::{EntityId, WorkspaceId};
use async_trait::async_trait;

/// Failure of a single remote call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// Request budget exhausted
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Call did not complete (network, timeout, 5xx)
    #[error("transport failure: {0}")]
    Transport(String),

    /// Referenced workspace or entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Platform refused the request (validation, missing access)
    #[error("rejected: {0}")]
    Rejected(String),
}

impl PlatformError {
    /// Whether retrying the same call later could succeed
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transport(_))
    }
}

/// Read/write access to one platform's workspaces
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// List all categories of a workspace
    async fn list_categories(&self, workspace: WorkspaceId)
        -> Result<Vec<LiveCategory>, PlatformError>;

    /// List all channels of a workspace (parented or not)
    async fn list_channels(&self, workspace: WorkspaceId)
        -> Result<Vec<LiveChannel>, PlatformError>;

    /// List all roles of a workspace, including the default role
    async fn list_roles(&self, workspace: WorkspaceId) -> Result<Vec<LiveRole>, PlatformError>;

    /// Create a category
    async fn create_category(
        &self,
        workspace: WorkspaceId,
        spec: NewCategory,
    ) -> Result<LiveCategory, PlatformError>;

    /// Create a channel
    async fn create_channel(
        &self,
        workspace: WorkspaceId,
        spec: NewChannel,
    ) -> Result<LiveChannel, PlatformError>;

    /// Create a role
    async fn create_role(
        &self,
        workspace: WorkspaceId,
        spec: NewRole,
    ) -> Result<LiveRole, PlatformError>;

    /// Set (insert or replace) the overwrite for `overwrite.subject` on a
    /// category or channel
    async fn edit_overwrite(
        &self,
        workspace: WorkspaceId,
        target: EntityId,
        overwrite: Overwrite,
    ) -> Result<(), PlatformError>;
}

/// Fetch the full live graph of a workspace
///
/// Issues the three list calls sequentially; the first failure aborts.
pub async fn fetch_graph<P>(platform: &P, workspace: WorkspaceId) -> Result<LiveGraph, PlatformError>
where
    P: PlatformClient + ?Sized,
{
    let categories = platform.list_categories(workspace).await?;
    let channels = platform.list_channels(workspace).await?;
    let roles = platform.list_roles(workspace).await?;
    tracing::debug!(
        workspace = %workspace,
        categories = categories.len(),
        channels = channels.len(),
        roles = roles.len(),
        "fetched live graph"
    );
    Ok(LiveGraph {
        categories,
        channels,
        roles,
    })
}
