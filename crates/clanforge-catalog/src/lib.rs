//! clanforge catalog - static templates and role families
//!
//! Data-only description of what a provisioned workspace should contain.
//! Nothing here talks to the platform.

#![warn(unreachable_pub)]

pub mod builtin;
pub mod error;
pub mod registry;
pub mod roles;
pub mod template;

pub use builtin::{builtin_templates, STANDARD};
pub use error::CatalogError;
pub use registry::TemplateCatalog;
pub use roles::{
    position_role, purpose_role, tier_role, ClanPosition, Purpose, RoleFamily, RoleRank,
    RoleSetRequest, RoleSpec, MAX_TIER,
};
pub use template::{CategorySpec, ChannelSpec, Template};
