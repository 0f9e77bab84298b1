//! The in-memory module table consulted by the resolver.

use super::validator::check_structure;
use super::{catalog, ModuleManifest};
use crate::constants::CORE_MODULE_ID;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;

/// Append-only table of module manifests, keyed by ID in registration order.
///
/// Always holds the synthetic [`ModuleManifest::core`] entry.
#[derive(Debug)]
pub struct ModuleRegistry {
    modules: IndexMap<String, ModuleManifest>,
}

impl ModuleRegistry {
    /// Creates a registry containing only the core manifest.
    pub fn new() -> Self {
        let mut modules = IndexMap::new();
        modules.insert(CORE_MODULE_ID.to_string(), ModuleManifest::core());
        Self { modules }
    }

    /// Creates a registry holding core and every built-in catalog module.
    pub fn with_catalog() -> Result<Self> {
        let mut registry = Self::new();
        for manifest in catalog::builtin_modules() {
            registry.register(manifest)?;
        }
        Ok(registry)
    }

    /// Adds a manifest to the registry.
    ///
    /// # Errors
    /// * `Error::InvalidManifest` if the manifest fails structural validation
    /// * `Error::DuplicateModule` if a manifest with the same ID exists
    pub fn register(&mut self, manifest: ModuleManifest) -> Result<()> {
        check_structure(&manifest).map_err(|(field, reason)| Error::InvalidManifest {
            source_label: format!("module '{}'", manifest.id),
            field: field.to_string(),
            reason,
        })?;

        if self.modules.contains_key(&manifest.id) {
            return Err(Error::DuplicateModule { id: manifest.id });
        }

        debug!("Registering module '{}'", manifest.id);
        self.modules.insert(manifest.id.clone(), manifest);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ModuleManifest> {
        self.modules.get(id)
    }

    pub fn has(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    /// Iterates manifests in registration order. The iterator is `Clone`, so
    /// it can be restarted from any point.
    pub fn all(&self) -> impl Iterator<Item = &ModuleManifest> + Clone {
        self.modules.values()
    }

    /// Position of `id` in registration order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.modules.get_index_of(id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
