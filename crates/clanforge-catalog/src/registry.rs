//! Template registry
//!
//! Provides [`TemplateCatalog`] for looking up templates by name. Loaded
//! once at startup (builtins plus optional YAML files) and read-only
//! afterwards.

use crate::builtin::builtin_templates;
use crate::error::CatalogError;
use crate::template::Template;
use clanforge_graph::normalize_name;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// YAML template file layout
#[derive(Debug, Deserialize)]
struct TemplateFile {
    templates: Vec<Template>,
}

/// Registry of templates keyed by normalized name
#[derive(Debug, Default, Clone)]
pub struct TemplateCatalog {
    templates: IndexMap<String, Arc<Template>>,
}

impl TemplateCatalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            templates: IndexMap::new(),
        }
    }

    /// Create catalog with the builtin templates
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        for template in builtin_templates() {
            // builtins are covered by tests; a failure here is a programming error
            if let Err(e) = catalog.register(template) {
                tracing::error!(error = %e, "builtin template rejected");
            }
        }
        catalog
    }

    /// Register (or replace) a template after validating it
    ///
    /// # Errors
    /// Returns the validation error; the catalog is unchanged.
    pub fn register(&mut self, template: Template) -> Result<(), CatalogError> {
        template.validate()?;
        let key = normalize_name(&template.name);
        if self.templates.contains_key(&key) {
            tracing::warn!(template = %template.name, "replacing registered template");
        }
        self.templates.insert(key, Arc::new(template));
        Ok(())
    }

    /// Look up a template (case- and decoration-insensitive)
    ///
    /// # Errors
    /// `CatalogError::UnknownTemplate` if nothing is registered under `name`.
    pub fn get(&self, name: &str) -> Result<Arc<Template>, CatalogError> {
        self.templates
            .get(&normalize_name(name))
            .cloned()
            .ok_or_else(|| CatalogError::UnknownTemplate(name.to_string()))
    }

    /// Check if template exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(&normalize_name(name))
    }

    /// Registered template names, in registration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.templates.values().map(|t| t.name.as_str()).collect()
    }

    /// Iterate over templates in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Template>> {
        self.templates.values()
    }

    /// Number of registered templates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Check if catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Parse templates from YAML text and register them
    ///
    /// Expects a top-level `templates:` list. Either every template is
    /// registered or none is.
    ///
    /// # Errors
    /// Parse or validation errors.
    pub fn load_yaml_str(&mut self, yaml: &str) -> Result<usize, CatalogError> {
        let file: TemplateFile = serde_yaml::from_str(yaml)?;
        for template in &file.templates {
            template.validate()?;
        }
        let count = file.templates.len();
        for template in file.templates {
            self.register(template)?;
        }
        Ok(count)
    }

    /// Read a YAML template file and register its templates
    ///
    /// # Errors
    /// I/O, parse or validation errors.
    pub fn load_yaml(&mut self, path: &Path) -> Result<usize, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let count = self.load_yaml_str(&text)?;
        tracing::info!(path = %path.display(), count, "loaded extra templates");
        Ok(count)
    }
}
