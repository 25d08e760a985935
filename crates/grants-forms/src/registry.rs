//! Registry of loaded forms

use crate::definition::FormDefinition;
use crate::error::FormError;
use indexmap::IndexMap;
use std::path::Path;
use std::sync::Arc;

/// Forms keyed by slug, in load order
#[derive(Debug, Clone, Default)]
pub struct FormRegistry {
    forms: IndexMap<String, Arc<FormDefinition>>,
}

impl FormRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.yaml`/`*.yml` file in a directory, sorted by file name
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, FormError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| FormError::io_error(dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| FormError::io_error(dir, e))?.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if is_yaml && path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        let mut registry = Self::new();
        for path in files {
            let source =
                std::fs::read_to_string(&path).map_err(|e| FormError::io_error(&path, e))?;
            let form = FormDefinition::from_yaml(&source).map_err(|source| FormError::Load {
                path: path.clone(),
                source: Box::new(source),
            })?;
            tracing::debug!(slug = %form.slug, path = %path.display(), "loaded form definition");
            registry.register(form)?;
        }

        tracing::info!(forms = registry.len(), dir = %dir.display(), "form definitions loaded");
        Ok(registry)
    }

    /// Add a validated form
    pub fn register(&mut self, form: FormDefinition) -> Result<(), FormError> {
        form.validate()?;
        if self.forms.contains_key(&form.slug) {
            return Err(FormError::DuplicateSlug(form.slug));
        }
        self.forms.insert(form.slug.clone(), Arc::new(form));
        Ok(())
    }

    /// Form by slug
    #[inline]
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<Arc<FormDefinition>> {
        self.forms.get(slug).cloned()
    }

    /// Slugs in load order
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.forms.keys().map(String::as_str)
    }

    /// Number of forms
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    /// Whether no forms are loaded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}
