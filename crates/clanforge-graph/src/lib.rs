//! clanforge graph - live workspace resource model
//!
//! The leaf crate of the workspace:
//! - Identifier newtypes and the permission bit set
//! - Live entities, creation requests and permission overwrites
//! - [`EntityError`], the per-entity failure row shared by every report
//! - The [`PlatformClient`] seam every remote call goes through
//! - Name normalization used by all matchers
//! - The mutation [`Throttle`]
//! - [`SimulatedPlatform`], an in-memory platform for tests and offline use
//!
//! # Example
//!
//! ```rust,ignore
//! use clanforge_graph::{fetch_graph, SimulatedPlatform, WorkspaceId};
//!
//! let platform = SimulatedPlatform::new();
//! platform.seed_workspace(WorkspaceId(1));
//! let graph = fetch_graph(&platform, WorkspaceId(1)).await?;
//! assert_eq!(graph.entity_count(), 0);
//! ```

#![warn(unreachable_pub)]

pub mod entity;
pub mod failure;
pub mod ids;
pub mod normalize;
pub mod permissions;
pub mod platform;
pub mod simulator;
pub mod throttle;

pub use entity::{
    ChannelKind, EntityKind, LiveCategory, LiveChannel, LiveGraph, LiveRole, NewCategory,
    NewChannel, NewRole, Overwrite, OverwriteSubject,
};
pub use failure::{EntityError, ErrorClass};
pub use ids::{EntityId, UserId, WorkspaceId};
pub use normalize::{names_match, normalize_name};
pub use permissions::Permissions;
pub use platform::{fetch_graph, PlatformClient, PlatformError};
pub use simulator::{PlatformCall, SimulatedPlatform, SimulatedWorkspace};
pub use throttle::Throttle;
