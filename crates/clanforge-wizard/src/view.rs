//! Render contract
//!
//! Each step renders to a [`StepView`]: a title, a body and the controls
//! the presentation layer should offer. Control ids are exactly the option
//! strings the corresponding [`WizardAction`](crate::WizardAction) expects.

use crate::selections::{Feature, Selections};
use crate::step::WizardStep;
use clanforge_catalog::{RoleFamily, RoleSpec, Template};
use clanforge_graph::LiveGraph;
use clanforge_reconcile::{plan_permissions, plan_roles, plan_structure, PermissionPolicy};
use serde::Serialize;
use std::fmt::Write as _;

/// Kind of an interactive control
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlKind {
    /// Plain button
    Button,
    /// Multi-select toggle
    Toggle { on: bool },
    /// Single-select option
    Choice { selected: bool },
    /// Free text field
    TextInput { value: Option<String> },
}

/// One control on a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Control {
    /// Action target
    pub id: String,
    /// Display label
    pub label: String,
    /// Control kind
    pub kind: ControlKind,
}

impl Control {
    fn button(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind: ControlKind::Button,
        }
    }

    fn toggle(id: &str, label: &str, on: bool) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind: ControlKind::Toggle { on },
        }
    }

    fn choice(id: &str, label: &str, selected: bool) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind: ControlKind::Choice { selected },
        }
    }
}

/// Counts shown before confirming
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    /// Categories to create
    pub categories: usize,
    /// Channels to create
    pub channels: usize,
    /// Roles to create
    pub roles: usize,
    /// Overwrites to apply
    pub overwrites: usize,
    /// Desired entities already present
    pub present: usize,
}

impl DiffSummary {
    /// Dry-run the selected template and roles against the live graph
    #[must_use]
    pub fn compute(
        template: &Template,
        roles: &[RoleSpec],
        policy: PermissionPolicy,
        live: &LiveGraph,
    ) -> Self {
        let structure = plan_structure(template, live);
        let missing_roles = plan_roles(roles, live).len();
        Self {
            categories: structure.categories.len(),
            channels: structure.channels.len(),
            roles: missing_roles,
            overwrites: plan_permissions(policy, template, roles).overwrites,
            present: structure.present + roles.len() - missing_roles,
        }
    }

    /// Entities that would be created
    #[must_use]
    pub fn to_create(&self) -> usize {
        self.categories + self.channels + self.roles
    }
}

/// Rendered step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepView {
    /// Step rendered
    pub step: WizardStep,
    /// Heading
    pub title: String,
    /// Body text
    pub body: String,
    /// Selections at render time
    pub selections: Selections,
    /// Controls in display order
    pub controls: Vec<Control>,
}

/// Everything a step needs to render
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Template names offered
    pub templates: &'a [String],
    /// Diff for the confirmation step
    pub diff: Option<&'a DiffSummary>,
}

/// Render `step` for the current selections
#[must_use]
pub fn render(step: WizardStep, selections: &Selections, ctx: RenderContext<'_>) -> StepView {
    let mut controls = Vec::new();
    let body = match step {
        WizardStep::Welcome => {
            "This will create the channels, roles and permissions for your clan. \
             Nothing is changed until you confirm on the last step."
                .to_string()
        }
        WizardStep::ClanSelection => {
            controls.push(Control {
                id: "clan-tag".to_string(),
                label: "Clan tag".to_string(),
                kind: ControlKind::TextInput {
                    value: selections.clan_tag.clone(),
                },
            });
            match &selections.clan_tag {
                Some(tag) => format!("Linked clan: {tag}"),
                None => "Enter your clan tag (for example #2PP).".to_string(),
            }
        }
        WizardStep::StructureTemplate => {
            controls.extend(
                ctx.templates
                    .iter()
                    .map(|name| Control::choice(name, name, *name == selections.template)),
            );
            format!("Layout: {}", selections.template)
        }
        WizardStep::RoleFamilies => {
            controls.extend(RoleFamily::ALL.into_iter().map(|family| {
                Control::toggle(
                    family.key(),
                    family_label(family),
                    selections.role_families.contains(&family),
                )
            }));
            let (lo, hi) = (selections.tier_levels.start(), selections.tier_levels.end());
            format!("Tier levels {lo}-{hi}")
        }
        WizardStep::PermissionPolicy => {
            controls.extend(PermissionPolicy::ALL.into_iter().map(|policy| {
                Control::choice(policy.key(), policy.label(), policy == selections.policy)
            }));
            format!("Policy: {}", selections.policy.label())
        }
        WizardStep::Features => {
            controls.extend(Feature::ALL.into_iter().map(|feature| {
                Control::toggle(
                    feature.key(),
                    feature.label(),
                    selections.features.contains(&feature),
                )
            }));
            "Pick the features to enable in your channels.".to_string()
        }
        WizardStep::Confirmation => {
            controls.push(Control::button("confirm", "Create everything"));
            confirmation_body(selections, ctx.diff)
        }
        WizardStep::Complete => "Setup finished.".to_string(),
    };

    if step.is_interactive() {
        if step != WizardStep::Welcome {
            controls.push(Control::button("prev", "Back"));
        }
        if step != WizardStep::Confirmation {
            controls.push(Control::button("next", "Next"));
        }
        controls.push(Control::button("cancel", "Cancel"));
    }

    StepView {
        step,
        title: step.title().to_string(),
        body,
        selections: selections.clone(),
        controls,
    }
}

fn family_label(family: RoleFamily) -> &'static str {
    match family {
        RoleFamily::ClanPosition => "Clan positions (Leader, Co-Leader, Elder, Member)",
        RoleFamily::Tier => "Tier roles",
        RoleFamily::Purpose => "Purpose roles (War Ready, Recruiter, ...)",
    }
}

fn confirmation_body(selections: &Selections, diff: Option<&DiffSummary>) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "Clan: {}", selections.clan_tag.as_deref().unwrap_or("-"));
    let _ = writeln!(body, "Layout: {}", selections.template);
    let _ = writeln!(body, "Policy: {}", selections.policy.label());
    match diff {
        Some(diff) => {
            let _ = writeln!(
                body,
                "Will create {} categories, {} channels and {} roles, and set {} permission overwrites ({} already present).",
                diff.categories, diff.channels, diff.roles, diff.overwrites, diff.present
            );
        }
        None => {
            let _ = writeln!(body, "The current workspace could not be read; changes are unknown.");
        }
    }
    body
}
