//! Provisioning context
//!
//! The long-lived object owned by the hosting process. It holds the
//! platform client, the single mutation throttle every operation shares,
//! the template catalog, the snapshot store and the wizard orchestrator,
//! and exposes the programmatic entry points usable outside the wizard.

use crate::config::ProvisionConfig;
use crate::error::ProvisionError;
use clanforge_catalog::{CatalogError, TemplateCatalog};
use clanforge_graph::{fetch_graph, PlatformClient, Throttle, WorkspaceId};
use clanforge_reconcile::{plan_structure, Reconciler, StructurePlan, StructureReport};
use clanforge_snapshot::{
    capture, FileSnapshotStore, RestoreEngine, RestoreReport, SnapshotId, SnapshotMeta,
    SnapshotStore,
};
use clanforge_wizard::{ClanAssociationStore, MemoryAssociationStore, Orchestrator};
use std::sync::Arc;

/// Builder for [`Provisioner`]
pub struct ProvisionerBuilder {
    platform: Arc<dyn PlatformClient>,
    config: ProvisionConfig,
    catalog: Option<TemplateCatalog>,
    snapshots: Option<Arc<dyn SnapshotStore>>,
    associations: Option<Arc<dyn ClanAssociationStore>>,
}

impl ProvisionerBuilder {
    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: ProvisionConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this catalog instead of the builtin one
    #[inline]
    #[must_use]
    pub fn with_catalog(mut self, catalog: TemplateCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Use this store instead of a file store under `snapshot_dir`
    #[inline]
    #[must_use]
    pub fn with_snapshot_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.snapshots = Some(store);
        self
    }

    /// Use this association store instead of the in-memory one
    #[inline]
    #[must_use]
    pub fn with_association_store(mut self, store: Arc<dyn ClanAssociationStore>) -> Self {
        self.associations = Some(store);
        self
    }

    /// Validate the configuration and assemble the context
    ///
    /// # Errors
    /// - `Config` if validation fails
    /// - `Catalog` if an extra template file is invalid or the default
    ///   template is not registered
    pub fn build(self) -> Result<Provisioner, ProvisionError> {
        let config = self.config;
        config.validate()?;

        let mut catalog = self.catalog.unwrap_or_else(TemplateCatalog::with_defaults);
        for path in &config.extra_templates {
            let loaded = catalog.load_yaml(path)?;
            tracing::info!(path = %path.display(), loaded, "extra templates loaded");
        }
        if !catalog.contains(&config.default_template) {
            return Err(CatalogError::UnknownTemplate(config.default_template.clone()).into());
        }

        let catalog = Arc::new(catalog);
        let throttle = Arc::new(Throttle::new(config.mutation_delay()));
        let snapshots = self
            .snapshots
            .unwrap_or_else(|| Arc::new(FileSnapshotStore::new(config.snapshot_dir.clone())));
        let associations = self
            .associations
            .unwrap_or_else(|| Arc::new(MemoryAssociationStore::new()));
        let wizard = Orchestrator::new(
            Arc::clone(&self.platform),
            Arc::clone(&throttle),
            Arc::clone(&catalog),
            associations,
            config.wizard(),
        );

        Ok(Provisioner {
            platform: self.platform,
            throttle,
            catalog,
            snapshots,
            wizard,
            config,
        })
    }
}

/// Shared provisioning context
pub struct Provisioner {
    platform: Arc<dyn PlatformClient>,
    throttle: Arc<Throttle>,
    catalog: Arc<TemplateCatalog>,
    snapshots: Arc<dyn SnapshotStore>,
    wizard: Orchestrator,
    config: ProvisionConfig,
}

impl Provisioner {
    /// Start building a context around `platform`
    #[must_use]
    pub fn builder(platform: Arc<dyn PlatformClient>) -> ProvisionerBuilder {
        ProvisionerBuilder {
            platform,
            config: ProvisionConfig::default(),
            catalog: None,
            snapshots: None,
            associations: None,
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    /// Template catalog
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Wizard orchestrator sharing this context
    #[inline]
    #[must_use]
    pub fn wizard(&self) -> &Orchestrator {
        &self.wizard
    }

    /// Dry-run a template against the workspace
    ///
    /// # Errors
    /// `Catalog` for an unknown template, `Platform` if listing fails.
    pub async fn plan_template(
        &self,
        workspace: WorkspaceId,
        template: &str,
    ) -> Result<StructurePlan, ProvisionError> {
        let template = self.catalog.get(template)?;
        let live = fetch_graph(self.platform.as_ref(), workspace).await?;
        Ok(plan_structure(&template, &live))
    }

    /// Create the template's missing categories and channels
    ///
    /// Per-entity failures are in the report; only an unknown template or
    /// an unreadable workspace fail the call, both before any mutation.
    ///
    /// # Errors
    /// `Catalog` for an unknown template, `Platform` if listing fails.
    #[tracing::instrument(skip(self), fields(workspace = %workspace))]
    pub async fn apply_template(
        &self,
        workspace: WorkspaceId,
        template: &str,
    ) -> Result<StructureReport, ProvisionError> {
        let template = self.catalog.get(template)?;
        let live = fetch_graph(self.platform.as_ref(), workspace).await?;
        let report = Reconciler::new(self.platform.as_ref(), &self.throttle, workspace)
            .reconcile_structure(&template, &live)
            .await;
        Ok(report)
    }

    /// Capture the workspace and persist it under a fresh id
    ///
    /// # Errors
    /// `Snapshot` if listing or storage fails.
    #[tracing::instrument(skip(self), fields(workspace = %workspace))]
    pub async fn create_snapshot(&self, workspace: WorkspaceId) -> Result<SnapshotMeta, ProvisionError> {
        let snapshot = capture(self.platform.as_ref(), workspace).await?;
        self.snapshots.put(&snapshot).await?;
        let meta = snapshot.meta();
        tracing::info!(snapshot = %meta.snapshot_id, entities = snapshot.entity_count(), "snapshot stored");
        Ok(meta)
    }

    /// Snapshots of the workspace, newest first
    ///
    /// # Errors
    /// `Snapshot` if the store cannot be read.
    pub async fn list_snapshots(&self, workspace: WorkspaceId) -> Result<Vec<SnapshotMeta>, ProvisionError> {
        Ok(self.snapshots.list(workspace).await?)
    }

    /// Recreate what the workspace is missing from a stored snapshot
    ///
    /// # Errors
    /// `Snapshot` if the snapshot does not exist, is unreadable or belongs
    /// to another workspace, or if the workspace cannot be listed. All of
    /// these are raised before any mutation.
    #[tracing::instrument(skip(self), fields(workspace = %workspace, snapshot = %id))]
    pub async fn restore_snapshot(
        &self,
        workspace: WorkspaceId,
        id: SnapshotId,
    ) -> Result<RestoreReport, ProvisionError> {
        let snapshot = self.snapshots.get(workspace, id).await?;
        let report = RestoreEngine::new(self.platform.as_ref(), &self.throttle)
            .with_unmapped_subjects(self.config.unmapped_subject)
            .restore(workspace, &snapshot)
            .await?;
        Ok(report)
    }
}

impl std::fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("config", &self.config)
            .field("templates", &self.catalog.names())
            .finish_non_exhaustive()
    }
}
