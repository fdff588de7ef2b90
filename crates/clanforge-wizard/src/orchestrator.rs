//! Wizard orchestrator
//!
//! Owns the session registry and the shared provisioning context. Every
//! interaction is checked against the session owner first; only `Confirm`
//! has side effects on the platform.

use crate::association::ClanAssociationStore;
use crate::error::SessionError;
use crate::pipeline::{Pipeline, PipelineRequest};
use crate::progress::ProgressSink;
use crate::registry::SessionRegistry;
use crate::session::{Transition, WizardAction, WizardSession};
use crate::step::WizardStep;
use crate::summary::ProvisionSummary;
use crate::view::{render, DiffSummary, RenderContext, StepView};
use clanforge_catalog::{TemplateCatalog, STANDARD};
use clanforge_graph::{fetch_graph, PlatformClient, Throttle, UserId, WorkspaceId};
use std::sync::Arc;
use std::time::Duration;

/// Wizard tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardConfig {
    /// Sessions idle longer than this are evicted
    pub session_idle_timeout: Duration,
    /// Concurrent session cap
    pub max_sessions: u64,
    /// Errors listed in the completion report before "and N more"
    pub summary_error_limit: usize,
    /// Template preselected for new sessions
    pub default_template: String,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            session_idle_timeout: Duration::from_secs(900),
            max_sessions: 10_000,
            summary_error_limit: 10,
            default_template: STANDARD.to_string(),
        }
    }
}

/// Response to an accepted interaction
#[derive(Debug, Clone)]
pub enum Reply {
    /// Render this view
    View(StepView),
    /// Session discarded
    Cancelled,
    /// Provisioning ran; the session is gone
    Completed {
        summary: ProvisionSummary,
        /// `summary` rendered with the configured error limit
        report: String,
    },
}

/// Drives wizard sessions for any number of workspaces
pub struct Orchestrator {
    platform: Arc<dyn PlatformClient>,
    throttle: Arc<Throttle>,
    catalog: Arc<TemplateCatalog>,
    associations: Arc<dyn ClanAssociationStore>,
    registry: SessionRegistry,
    config: WizardConfig,
}

impl Orchestrator {
    /// Create orchestrator sharing the given context
    #[must_use]
    pub fn new(
        platform: Arc<dyn PlatformClient>,
        throttle: Arc<Throttle>,
        catalog: Arc<TemplateCatalog>,
        associations: Arc<dyn ClanAssociationStore>,
        config: WizardConfig,
    ) -> Self {
        let registry = SessionRegistry::new(config.session_idle_timeout, config.max_sessions);
        Self {
            platform,
            throttle,
            catalog,
            associations,
            registry,
            config,
        }
    }

    /// Active sessions
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Wizard settings
    #[inline]
    #[must_use]
    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    fn default_template(&self) -> String {
        match self.catalog.get(&self.config.default_template) {
            Ok(template) => template.name.clone(),
            Err(_) => self
                .catalog
                .names()
                .first()
                .map_or_else(|| self.config.default_template.clone(), |n| (*n).to_string()),
        }
    }

    fn render(&self, session: &WizardSession) -> StepView {
        let templates: Vec<String> = self.catalog.names().into_iter().map(String::from).collect();
        render(
            session.step,
            &session.selections,
            RenderContext {
                templates: &templates,
                diff: session.diff.as_ref(),
            },
        )
    }

    /// Start a wizard for `workspace` owned by `user`
    ///
    /// # Errors
    /// `SessionError::AlreadyActive` if the workspace already has a session.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self, workspace: WorkspaceId, user: UserId) -> Result<StepView, SessionError> {
        let session = WizardSession::new(workspace, user, self.default_template());
        let handle = self.registry.start(session).await?;
        let session = handle.lock().await;
        Ok(self.render(&session))
    }

    /// Current view of the session
    ///
    /// # Errors
    /// `NoActiveSession` or `NotOwner`.
    pub async fn view(&self, workspace: WorkspaceId, user: UserId) -> Result<StepView, SessionError> {
        let handle = self.registry.get(workspace, user).await?;
        let session = handle.lock().await;
        Ok(self.render(&session))
    }

    /// Apply one user interaction
    ///
    /// # Errors
    /// Any [`SessionError`]; a rejected interaction changes nothing.
    #[tracing::instrument(skip(self, sink), fields(action = %action))]
    pub async fn interact(
        &self,
        workspace: WorkspaceId,
        user: UserId,
        action: WizardAction,
        sink: &dyn ProgressSink,
    ) -> Result<Reply, SessionError> {
        let handle = self.registry.get(workspace, user).await?;

        // handled without the state lock; a running pipeline skips its remaining stages
        if action == WizardAction::Cancel {
            handle.cancel();
            self.registry.end(workspace, &handle).await;
            tracing::info!(%workspace, "session cancelled");
            return Ok(Reply::Cancelled);
        }

        let mut session = handle.lock().await;
        match session.apply(&action, &self.catalog)? {
            Transition::Stay | Transition::Cancelled => Ok(Reply::View(self.render(&session))),
            Transition::Moved { to, .. } => {
                if to == WizardStep::Confirmation {
                    session.diff = self.diff(&session).await;
                }
                Ok(Reply::View(self.render(&session)))
            }
            Transition::Confirmed => {
                let selections = session.selections.clone();
                drop(session);

                let pipeline = Pipeline::new(
                    self.platform.as_ref(),
                    self.throttle.as_ref(),
                    self.catalog.as_ref(),
                    self.associations.as_ref(),
                );
                let summary = pipeline
                    .run(
                        PipelineRequest {
                            workspace,
                            user,
                            selections: &selections,
                        },
                        &handle,
                        sink,
                    )
                    .await;
                self.registry.end(workspace, &handle).await;
                let report = summary.render(self.config.summary_error_limit);
                Ok(Reply::Completed { summary, report })
            }
        }
    }

    async fn diff(&self, session: &WizardSession) -> Option<DiffSummary> {
        let template = self.catalog.get(&session.selections.template).ok()?;
        let roles = session.selections.role_request().expand().ok()?;
        match fetch_graph(self.platform.as_ref(), session.workspace).await {
            Ok(live) => Some(DiffSummary::compute(
                &template,
                &roles,
                session.selections.policy,
                &live,
            )),
            Err(e) => {
                tracing::warn!(workspace = %session.workspace, error = %e, "diff listing failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
