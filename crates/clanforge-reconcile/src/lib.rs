//! clanforge reconcile - desired vs live
//!
//! Reconcilers compare a declarative desired state against the live graph
//! and create only what is missing:
//! - Structure: template categories, then their channels
//! - Roles: a role set, in hierarchy order
//! - Permissions: per-channel overwrites from a policy and the classifier
//!   cascade
//!
//! Every reconciler is best-effort. It returns a report with created,
//! skipped and failed entities instead of an error; remote mutations are
//! sequential and paced by the shared [`Throttle`](clanforge_graph::Throttle).
//!
//! # Example
//!
//! ```rust,ignore
//! use clanforge_reconcile::Reconciler;
//!
//! let reconciler = Reconciler::new(&platform, &throttle, workspace);
//! let live = fetch_graph(&platform, workspace).await?;
//! let report = reconciler.reconcile_structure(&template, &live).await;
//! println!("{} created, {} errors", report.created.len(), report.errors.len());
//! ```

#![warn(unreachable_pub)]

pub mod observe;
pub mod permissions;
pub mod reconciler;
pub mod report;
pub mod roles;
pub mod structure;

pub use permissions::{
    class_grants, classify, is_class, plan_permissions, ChannelClass, Grant, PermissionPlan,
    PermissionPolicy, SubjectClass,
};
pub use observe::{MutationOutcome, NoObserver, ReconcileObserver};
pub use reconciler::Reconciler;
pub use report::{
    CreatedEntity, EditedOverwrite, EntityError, ErrorClass, PermissionReport, ReconcileOutcome,
    ResolvedCategory, ResolvedChannel, ResolvedRole, RoleReport, SkippedEntity, StructureReport,
};
pub use roles::plan_roles;
pub use structure::{plan_structure, StructurePlan};
