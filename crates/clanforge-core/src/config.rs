//! Provisioning configuration
//!
//! Loaded from TOML. Every field is optional; missing fields take the
//! defaults below.
//!
//! ```toml
//! mutation_delay_ms = 750
//! session_idle_timeout_secs = 900
//! max_sessions = 10000
//! summary_error_limit = 10
//! snapshot_dir = "snapshots"
//! unmapped_subject = "drop"
//! default_template = "standard"
//! extra_templates = ["templates/league.yaml"]
//! ```

use crate::error::ProvisionError;
use clanforge_catalog::STANDARD;
use clanforge_snapshot::UnmappedSubjectPolicy;
use clanforge_wizard::WizardConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Provisioning configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProvisionConfig {
    /// Delay between consecutive remote mutations
    pub mutation_delay_ms: u64,
    /// Idle time after which a wizard session is discarded
    pub session_idle_timeout_secs: u64,
    /// Session registry capacity
    pub max_sessions: u64,
    /// Errors listed in a summary before "and N more"
    pub summary_error_limit: usize,
    /// Root of the file snapshot store
    pub snapshot_dir: PathBuf,
    /// What to do with an overwrite subject that resolves to no role
    pub unmapped_subject: UnmappedSubjectPolicy,
    /// Template preselected by the wizard
    pub default_template: String,
    /// YAML template files merged into the catalog
    pub extra_templates: Vec<PathBuf>,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            mutation_delay_ms: 750,
            session_idle_timeout_secs: 900,
            max_sessions: 10_000,
            summary_error_limit: 10,
            snapshot_dir: PathBuf::from("snapshots"),
            unmapped_subject: UnmappedSubjectPolicy::Drop,
            default_template: STANDARD.to_string(),
            extra_templates: Vec::new(),
        }
    }
}

impl ProvisionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    /// `ProvisionError::Config` on malformed TOML, unknown keys or failed
    /// validation.
    pub fn from_toml_str(text: &str) -> Result<Self, ProvisionError> {
        let config: Self =
            toml::from_str(text).map_err(|e| ProvisionError::config(format!("invalid toml: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// `ProvisionError::Config` if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self, ProvisionError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ProvisionError::config(format!("failed to read {}: {e}", path.display())))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ProvisionError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        if self.session_idle_timeout_secs == 0 {
            return Err(ProvisionError::config("session_idle_timeout_secs must be positive"));
        }
        if self.max_sessions == 0 {
            return Err(ProvisionError::config("max_sessions must be positive"));
        }
        if self.summary_error_limit == 0 {
            return Err(ProvisionError::config("summary_error_limit must be positive"));
        }
        if self.default_template.trim().is_empty() {
            return Err(ProvisionError::config("default_template must not be empty"));
        }
        Ok(())
    }

    /// Delay between remote mutations
    #[inline]
    #[must_use]
    pub fn mutation_delay(&self) -> Duration {
        Duration::from_millis(self.mutation_delay_ms)
    }

    /// Wizard settings derived from this configuration
    #[must_use]
    pub fn wizard(&self) -> WizardConfig {
        WizardConfig {
            session_idle_timeout: Duration::from_secs(self.session_idle_timeout_secs),
            max_sessions: self.max_sessions,
            summary_error_limit: self.summary_error_limit,
            default_template: self.default_template.clone(),
        }
    }

    /// With mutation delay
    #[inline]
    #[must_use]
    pub fn with_mutation_delay(mut self, delay: Duration) -> Self {
        self.mutation_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With session idle timeout
    #[inline]
    #[must_use]
    pub fn with_session_idle_timeout(mut self, timeout: Duration) -> Self {
        self.session_idle_timeout_secs = timeout.as_secs();
        self
    }

    /// With summary error limit
    #[inline]
    #[must_use]
    pub fn with_summary_error_limit(mut self, limit: usize) -> Self {
        self.summary_error_limit = limit;
        self
    }

    /// With snapshot directory
    #[inline]
    #[must_use]
    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }

    /// With unmapped subject policy
    #[inline]
    #[must_use]
    pub fn with_unmapped_subject(mut self, policy: UnmappedSubjectPolicy) -> Self {
        self.unmapped_subject = policy;
        self
    }

    /// With default template
    #[inline]
    #[must_use]
    pub fn with_default_template(mut self, name: impl Into<String>) -> Self {
        self.default_template = name.into();
        self
    }
}
