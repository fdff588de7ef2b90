//! Wizard steps
//!
//! Strictly linear. `Next`/`Prev` move one position and are clamped to the
//! interactive range (Welcome..=Confirmation); `Complete` is only reachable
//! by confirming.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wizard state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    /// Introduction
    Welcome,
    /// Clan tag entry
    ClanSelection,
    /// Template choice
    StructureTemplate,
    /// Role family choice
    RoleFamilies,
    /// Overwrite policy choice
    PermissionPolicy,
    /// Feature choice
    Features,
    /// Review before provisioning
    Confirmation,
    /// Provisioning done
    Complete,
}

impl WizardStep {
    /// All steps in order
    pub const ORDER: [WizardStep; 8] = [
        Self::Welcome,
        Self::ClanSelection,
        Self::StructureTemplate,
        Self::RoleFamilies,
        Self::PermissionPolicy,
        Self::Features,
        Self::Confirmation,
        Self::Complete,
    ];

    /// Zero-based position
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// One step forward, clamped at Confirmation
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Confirmation | Self::Complete => self,
            _ => Self::ORDER[self.index() + 1],
        }
    }

    /// One step back, clamped at Welcome
    #[must_use]
    pub fn prev(self) -> Self {
        match self {
            Self::Welcome | Self::Complete => self,
            _ => Self::ORDER[self.index() - 1],
        }
    }

    /// Whether the step still accepts interaction
    #[must_use]
    pub fn is_interactive(self) -> bool {
        self != Self::Complete
    }

    /// Title shown when rendering the step
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Welcome => "Clan workspace setup",
            Self::ClanSelection => "Link your clan",
            Self::StructureTemplate => "Choose a channel layout",
            Self::RoleFamilies => "Choose roles",
            Self::PermissionPolicy => "Choose a permission policy",
            Self::Features => "Choose features",
            Self::Confirmation => "Review and confirm",
            Self::Complete => "Setup complete",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Welcome => "welcome",
            Self::ClanSelection => "clan-selection",
            Self::StructureTemplate => "structure-template",
            Self::RoleFamilies => "role-families",
            Self::PermissionPolicy => "permission-policy",
            Self::Features => "features",
            Self::Confirmation => "confirmation",
            Self::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// Steps reachable from `from` by a single navigation or confirm
#[must_use]
pub fn allowed_transitions(from: WizardStep) -> Vec<WizardStep> {
    match from {
        WizardStep::Welcome => vec![WizardStep::ClanSelection],
        WizardStep::Confirmation => vec![WizardStep::Features, WizardStep::Complete],
        WizardStep::Complete => vec![],
        other => vec![other.prev(), other.next()],
    }
}
