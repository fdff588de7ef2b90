//! Wizard session and its transition function
//!
//! [`WizardSession::apply`] is pure with respect to the platform: it
//! validates an action against the current step, mutates selections and
//! reports the resulting [`Transition`]. A rejected action leaves the
//! session untouched.

use crate::error::SessionError;
use crate::selections::{parse_clan_tag, parse_tier_range, Feature, Selections};
use crate::step::WizardStep;
use crate::view::DiffSummary;
use chrono::{DateTime, Utc};
use clanforge_catalog::{RoleFamily, TemplateCatalog};
use clanforge_graph::{UserId, WorkspaceId};
use clanforge_reconcile::{CreatedEntity, PermissionPolicy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// User interaction with the wizard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "option", rename_all = "kebab-case")]
pub enum WizardAction {
    /// Advance one step
    Next,
    /// Go back one step
    Prev,
    /// Abandon the wizard
    Cancel,
    /// Flip a multi-select option (role family or feature key)
    Toggle(String),
    /// Pick a single-select option (template name, policy key, tier range)
    Choose(String),
    /// Set the clan tag
    SetClanTag(String),
    /// Run provisioning
    Confirm,
}

impl WizardAction {
    /// Short action name used in errors and logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Prev => "prev",
            Self::Cancel => "cancel",
            Self::Toggle(_) => "toggle",
            Self::Choose(_) => "choose",
            Self::SetClanTag(_) => "set-clan-tag",
            Self::Confirm => "confirm",
        }
    }
}

impl fmt::Display for WizardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toggle(opt) | Self::Choose(opt) | Self::SetClanTag(opt) => {
                write!(f, "{} {opt}", self.name())
            }
            _ => f.write_str(self.name()),
        }
    }
}

/// Outcome of an accepted action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Same step, selections possibly changed
    Stay,
    /// Moved to another step
    Moved { from: WizardStep, to: WizardStep },
    /// Session ended
    Cancelled,
    /// Provisioning should run
    Confirmed,
}

/// State of one running wizard
#[derive(Debug, Clone, Serialize)]
pub struct WizardSession {
    /// Workspace being set up
    pub workspace: WorkspaceId,
    /// User driving the session
    pub owner: UserId,
    /// Current step
    pub step: WizardStep,
    /// Choices made so far
    pub selections: Selections,
    /// Computed on entering Confirmation
    pub diff: Option<DiffSummary>,
    /// Entities created by this run's pipeline
    pub created: Vec<CreatedEntity>,
    /// Session start
    pub started_at: DateTime<Utc>,
}

impl WizardSession {
    /// Fresh session at Welcome
    #[must_use]
    pub fn new(workspace: WorkspaceId, owner: UserId, template: impl Into<String>) -> Self {
        Self {
            workspace,
            owner,
            step: WizardStep::Welcome,
            selections: Selections::new(template),
            diff: None,
            created: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Apply `action` at the current step
    ///
    /// # Errors
    /// - `InvalidTransition` if the action is not offered at this step
    /// - `InvalidInput` if its option fails validation
    pub fn apply(
        &mut self,
        action: &WizardAction,
        catalog: &TemplateCatalog,
    ) -> Result<Transition, SessionError> {
        let step = self.step;
        if !step.is_interactive() {
            return Err(self.reject(action));
        }

        match (step, action) {
            (_, WizardAction::Cancel) => Ok(Transition::Cancelled),

            (WizardStep::ClanSelection, WizardAction::Next) if self.selections.clan_tag.is_none() => {
                Err(SessionError::invalid_input("link a clan tag before continuing"))
            }
            (_, WizardAction::Next) => Ok(self.move_to(step.next())),
            (_, WizardAction::Prev) => Ok(self.move_to(step.prev())),

            (WizardStep::ClanSelection, WizardAction::SetClanTag(raw)) => {
                self.selections.clan_tag = Some(parse_clan_tag(raw)?);
                Ok(Transition::Stay)
            }

            (WizardStep::StructureTemplate, WizardAction::Choose(name)) => {
                let template = catalog
                    .get(name)
                    .map_err(|e| SessionError::invalid_input(e.to_string()))?;
                self.selections.template.clone_from(&template.name);
                Ok(Transition::Stay)
            }

            (WizardStep::RoleFamilies, WizardAction::Toggle(key)) => {
                let family = RoleFamily::from_key(key)
                    .ok_or_else(|| SessionError::invalid_input(format!("unknown role family `{key}`")))?;
                self.selections.toggle_family(family);
                Ok(Transition::Stay)
            }
            (WizardStep::RoleFamilies, WizardAction::Choose(range)) => {
                self.selections.tier_levels = parse_tier_range(range)?;
                Ok(Transition::Stay)
            }

            (WizardStep::PermissionPolicy, WizardAction::Choose(key)) => {
                self.selections.policy = PermissionPolicy::from_key(key)
                    .ok_or_else(|| SessionError::invalid_input(format!("unknown policy `{key}`")))?;
                Ok(Transition::Stay)
            }

            (WizardStep::Features, WizardAction::Toggle(key)) => {
                let feature = Feature::from_key(key)
                    .ok_or_else(|| SessionError::invalid_input(format!("unknown feature `{key}`")))?;
                self.selections.toggle_feature(feature);
                Ok(Transition::Stay)
            }

            (WizardStep::Confirmation, WizardAction::Confirm) => {
                self.step = WizardStep::Complete;
                Ok(Transition::Confirmed)
            }

            _ => Err(self.reject(action)),
        }
    }

    fn move_to(&mut self, to: WizardStep) -> Transition {
        let from = self.step;
        if from == to {
            return Transition::Stay;
        }
        if from == WizardStep::Confirmation {
            self.diff = None;
        }
        self.step = to;
        Transition::Moved { from, to }
    }

    fn reject(&self, action: &WizardAction) -> SessionError {
        SessionError::InvalidTransition {
            step: self.step,
            action: action.name().to_string(),
        }
    }
}
