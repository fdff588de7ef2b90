//! Catalog errors

use std::path::PathBuf;

/// Template catalog errors
///
/// All of these are configuration errors: they surface before any remote
/// call is made.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// No template registered under this name
    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    /// Template failed validation
    #[error("invalid template {template}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// Tier level outside the supported range
    #[error("tier level {level} outside 1..={max}")]
    InvalidTierLevel { level: u8, max: u8 },

    /// Template file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template file is not valid YAML for the template schema
    #[error("failed to parse template file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl CatalogError {
    /// Create invalid-template error
    #[inline]
    pub fn invalid(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.into(),
            reason: reason.into(),
        }
    }
}
