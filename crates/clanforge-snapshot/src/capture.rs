//! Snapshot capture

use crate::error::SnapshotError;
use crate::model::Snapshot;
use clanforge_graph::{fetch_graph, PlatformClient, WorkspaceId};

/// Copy the live graph of `workspace` into a new snapshot
///
/// One listing walk; nothing is persisted here.
///
/// # Errors
/// `SnapshotError::Platform` if any listing call fails.
pub async fn capture<P>(platform: &P, workspace: WorkspaceId) -> Result<Snapshot, SnapshotError>
where
    P: PlatformClient + ?Sized,
{
    let graph = fetch_graph(platform, workspace).await?;
    let snapshot = Snapshot::from_graph(workspace, &graph);
    tracing::info!(
        workspace = %workspace,
        snapshot = %snapshot.snapshot_id,
        roles = snapshot.roles.len(),
        categories = snapshot.categories.len(),
        channels = snapshot.channels.len(),
        "captured snapshot"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clanforge_graph::{NewCategory, SimulatedPlatform};

    #[tokio::test]
    async fn captures_live_entities() {
        let sim = SimulatedPlatform::new();
        sim.seed_workspace(WorkspaceId(1));
        sim.create_category(WorkspaceId(1), NewCategory::named("Info"))
            .await
            .unwrap();

        let snap = capture(&sim, WorkspaceId(1)).await.unwrap();
        assert_eq!(snap.workspace_id, WorkspaceId(1));
        assert_eq!(snap.categories.len(), 1);
        assert!(snap.roles.is_empty());
    }

    #[tokio::test]
    async fn listing_failure_is_an_error() {
        let sim = SimulatedPlatform::new();
        sim.seed_workspace(WorkspaceId(1));
        sim.fail_listing(WorkspaceId(1));
        assert!(matches!(
            capture(&sim, WorkspaceId(1)).await.unwrap_err(),
            SnapshotError::Platform(_)
        ));
    }
}
