//! clanforge core - provisioning context
//!
//! Wires the catalog, reconcilers, snapshot store and wizard into one
//! [`Provisioner`] owned by the hosting process:
//! - `apply_template(workspace, template)`
//! - `create_snapshot(workspace)` / `list_snapshots(workspace)`
//! - `restore_snapshot(workspace, snapshot)`
//! - `wizard()` for the guided flow
//!
//! # Example
//!
//! ```rust,ignore
//! use clanforge_core::{ProvisionConfig, Provisioner};
//!
//! let config = ProvisionConfig::load("clanforge.toml".as_ref())?;
//! let provisioner = Provisioner::builder(platform).with_config(config).build()?;
//!
//! let report = provisioner.apply_template(workspace, "standard").await?;
//! let meta = provisioner.create_snapshot(workspace).await?;
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod provisioner;

pub use config::ProvisionConfig;
pub use error::ProvisionError;
pub use provisioner::{Provisioner, ProvisionerBuilder};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with clanforge
    pub use crate::{ProvisionConfig, ProvisionError, Provisioner};
    pub use clanforge_graph::{PlatformClient, UserId, WorkspaceId};
    pub use clanforge_snapshot::SnapshotId;
    pub use clanforge_wizard::{NoProgress, Reply, WizardAction, WizardStep};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
