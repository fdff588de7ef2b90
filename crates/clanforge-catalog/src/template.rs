//! Structure templates
//!
//! A [`Template`] describes the categories and channels a workspace should
//! have. Templates are immutable data; they are validated once when
//! registered in the catalog.

use crate::error::CatalogError;
use clanforge_graph::{normalize_name, ChannelKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Desired channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Channel name
    pub name: String,
    /// Text or voice
    #[serde(default = "default_kind")]
    pub kind: ChannelKind,
    /// Topic set on creation
    #[serde(default)]
    pub topic: Option<String>,
    /// Alternative names that count as this channel being present
    #[serde(default)]
    pub aliases: Vec<String>,
}

fn default_kind() -> ChannelKind {
    ChannelKind::Text
}

impl ChannelSpec {
    /// Text channel
    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ChannelKind::Text,
            topic: None,
            aliases: Vec::new(),
        }
    }

    /// Voice channel
    #[must_use]
    pub fn voice(name: impl Into<String>) -> Self {
        Self {
            kind: ChannelKind::Voice,
            ..Self::text(name)
        }
    }

    /// With topic
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// With aliases
    #[must_use]
    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| (*a).to_string()).collect();
        self
    }
}

/// Desired category with its channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    /// Category name
    pub name: String,
    /// Alternative names that count as this category being present
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Channels in creation order
    pub channels: Vec<ChannelSpec>,
}

impl CategorySpec {
    /// Category with channels
    #[must_use]
    pub fn new(name: impl Into<String>, channels: Vec<ChannelSpec>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            channels,
        }
    }

    /// With aliases
    #[must_use]
    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| (*a).to_string()).collect();
        self
    }
}

/// Named structure bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Catalog key
    pub name: String,
    /// One-line description shown in the wizard
    #[serde(default)]
    pub description: String,
    /// Categories in creation order
    pub categories: Vec<CategorySpec>,
}

impl Template {
    /// Number of categories plus channels
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.categories.len() + self.channel_count()
    }

    /// Number of channels across all categories
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.categories.iter().map(|c| c.channels.len()).sum()
    }

    /// Iterate `(category, channel)` pairs in template order
    pub fn channels(&self) -> impl Iterator<Item = (&CategorySpec, &ChannelSpec)> {
        self.categories
            .iter()
            .flat_map(|cat| cat.channels.iter().map(move |ch| (cat, ch)))
    }

    /// Validate structural rules
    ///
    /// # Errors
    /// - empty template name or entity name (after normalization)
    /// - two categories normalizing to the same name
    /// - two channels of the same kind normalizing to the same name
    pub fn validate(&self) -> Result<(), CatalogError> {
        if normalize_name(&self.name).is_empty() {
            return Err(CatalogError::invalid(&self.name, "template name is empty"));
        }
        if self.categories.is_empty() {
            return Err(CatalogError::invalid(&self.name, "template has no categories"));
        }

        let mut categories = HashSet::new();
        let mut channels = HashSet::new();
        for category in &self.categories {
            let key = normalize_name(&category.name);
            if key.is_empty() {
                return Err(CatalogError::invalid(&self.name, "category name is empty"));
            }
            if !categories.insert(key) {
                return Err(CatalogError::invalid(
                    &self.name,
                    format!("duplicate category {}", category.name),
                ));
            }
            for channel in &category.channels {
                let key = normalize_name(&channel.name);
                if key.is_empty() {
                    return Err(CatalogError::invalid(
                        &self.name,
                        format!("empty channel name in {}", category.name),
                    ));
                }
                if !channels.insert((channel.kind, key)) {
                    return Err(CatalogError::invalid(
                        &self.name,
                        format!("duplicate channel {}", channel.name),
                    ));
                }
            }
        }
        Ok(())
    }
}
