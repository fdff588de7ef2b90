//! clanforge wizard - guided provisioning
//!
//! A strictly linear dialogue that accumulates [`Selections`] and, on
//! confirmation, runs the provisioning pipeline:
//!
//! ```text
//! Welcome → ClanSelection → StructureTemplate → RoleFamilies
//!         → PermissionPolicy → Features → Confirmation → Complete
//! ```
//!
//! - [`WizardSession::apply`]: pure transition function per action
//! - [`render`]: render contract for the presentation layer
//! - [`SessionRegistry`]: one session per workspace, idle timeout, owner check
//! - [`Pipeline`]: Structure → Roles → Permissions → Features, best effort
//! - [`Orchestrator`]: ties the above to the shared platform context
//!
//! # Example
//!
//! ```rust,ignore
//! use clanforge_wizard::{NoProgress, Orchestrator, Reply, WizardAction};
//!
//! let view = orchestrator.start(workspace, user).await?;
//! let reply = orchestrator
//!     .interact(workspace, user, WizardAction::Next, &NoProgress)
//!     .await?;
//! if let Reply::Completed { report, .. } = reply {
//!     println!("{report}");
//! }
//! ```

#![warn(unreachable_pub)]

pub mod association;
pub mod error;
pub mod features;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;
pub mod registry;
pub mod selections;
pub mod session;
pub mod step;
pub mod summary;
pub mod view;

pub use association::{
    AssociationError, ClanAssociationStore, ClanLink, FeatureBinding, MemoryAssociationStore,
};
pub use error::SessionError;
pub use features::{bind_features, channel_for};
pub use orchestrator::{Orchestrator, Reply, WizardConfig};
pub use pipeline::{Pipeline, PipelineRequest, Stage, StageOutcome, StageStatus};
pub use progress::{NoProgress, ProgressEvent, ProgressSink};
pub use registry::{SessionHandle, SessionRegistry};
pub use selections::{parse_clan_tag, parse_tier_range, Feature, Selections};
pub use session::{Transition, WizardAction, WizardSession};
pub use step::{allowed_transitions, WizardStep};
pub use summary::ProvisionSummary;
pub use view::{render, Control, ControlKind, DiffSummary, RenderContext, StepView};
