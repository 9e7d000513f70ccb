//! Registry of available rename catalogs.

use std::{collections::BTreeMap, sync::Arc};

use crate::deobfuscation::catalogs::{Catalog, SdtdCatalog};

/// Holds the catalogs a tool can run, keyed by id.
pub struct CatalogRegistry {
    catalogs: BTreeMap<String, Arc<dyn Catalog>>,
}

impl Default for CatalogRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogRegistry {
    /// Creates a registry with all built-in catalogs registered.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(SdtdCatalog));
        registry
    }

    /// Creates a registry without any catalogs.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            catalogs: BTreeMap::new(),
        }
    }

    /// Registers a catalog, replacing one with the same id.
    pub fn register(&mut self, catalog: Arc<dyn Catalog>) {
        self.catalogs.insert(catalog.id(), catalog);
    }

    /// Removes a catalog by id.
    pub fn unregister(&mut self, id: &str) -> Option<Arc<dyn Catalog>> {
        self.catalogs.remove(id)
    }

    /// The catalog registered under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Catalog>> {
        self.catalogs.get(id)
    }

    /// Returns `true` if a catalog is registered under `id`.
    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.catalogs.contains_key(id)
    }

    /// Ids of all registered catalogs, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.catalogs.keys().map(String::as_str).collect()
    }

    /// Number of registered catalogs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    /// Returns `true` if no catalogs are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }

    /// All registered catalogs, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Catalog>> {
        self.catalogs.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deobfuscation::rule::Step;

    struct Empty;

    impl Catalog for Empty {
        fn id(&self) -> String {
            "empty".to_string()
        }

        fn name(&self) -> String {
            "Empty".to_string()
        }

        fn steps(&self) -> Vec<Box<dyn Step>> {
            Vec::new()
        }
    }

    #[test]
    fn test_builtin_registration() {
        let registry = CatalogRegistry::new();
        assert!(registry.has("sdtd"));
        assert_eq!(registry.ids(), vec!["sdtd"]);
        assert!(CatalogRegistry::empty().is_empty());
    }

    #[test]
    fn test_register_and_unregister() {
        let mut registry = CatalogRegistry::new();
        registry.register(Arc::new(Empty));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.ids(), vec!["empty", "sdtd"]);
        assert!(registry.unregister("empty").is_some());
        assert!(registry.get("empty").is_none());
    }
}
