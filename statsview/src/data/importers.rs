use std::sync::Arc;

use parking_lot::RwLock;

use super::error::RegistryError;
use crate::domain::Importer;

/// Importers in registration order, keyed by [`Importer::name`].
#[derive(Debug, Default)]
pub struct ImporterRegistry {
    importers: RwLock<Vec<Arc<dyn Importer>>>,
}

impl ImporterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an importer.
    ///
    /// Empty names are rejected because the name keys resolved values. An
    /// importer with an already registered name replaces it in place.
    pub fn register(&self, importer: Arc<dyn Importer>) -> Result<(), RegistryError> {
        let name = importer.name().to_string();
        if name.is_empty() {
            tracing::warn!("Refusing to register importer with an empty name");
            return Err(RegistryError::InvalidName { kind: "Importer" });
        }

        let mut importers = self.importers.write();
        match importers.iter().position(|i| i.name() == name) {
            Some(idx) => {
                tracing::debug!(importer = %name, "Replacing registered importer");
                importers[idx] = importer;
            }
            None => {
                tracing::debug!(importer = %name, "Registering importer");
                importers.push(importer);
            }
        }
        Ok(())
    }

    /// Remove by name. Returns false if nothing was registered under `name`.
    pub fn unregister(&self, name: &str) -> bool {
        let mut importers = self.importers.write();
        let before = importers.len();
        importers.retain(|i| i.name() != name);
        let removed = importers.len() != before;
        if removed {
            tracing::debug!(importer = %name, "Unregistered importer");
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Importer>> {
        self.importers
            .read()
            .iter()
            .find(|i| i.name() == name)
            .cloned()
    }

    /// Snapshot of the registered importers, in registration order
    pub fn all(&self) -> Vec<Arc<dyn Importer>> {
        self.importers.read().clone()
    }

    pub fn len(&self) -> usize {
        self.importers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.importers.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::StubImporter;

    fn names(registry: &ImporterRegistry) -> Vec<String> {
        registry
            .all()
            .iter()
            .map(|i| i.name().to_string())
            .collect()
    }

    #[test]
    fn test_register_empty_name() {
        let registry = ImporterRegistry::new();
        let err = registry
            .register(Arc::new(StubImporter::value("", 0.0)))
            .unwrap_err();
        assert_eq!(err, RegistryError::InvalidName { kind: "Importer" });
        assert!(registry.get("").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_acceptable_name() {
        let registry = ImporterRegistry::new();
        registry
            .register(Arc::new(StubImporter::value("X", 0.0)))
            .unwrap();
        assert!(registry.get("X").is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister() {
        let registry = ImporterRegistry::new();
        registry
            .register(Arc::new(StubImporter::value("X", 0.0)))
            .unwrap();
        assert!(registry.unregister("X"));
        assert!(registry.get("X").is_none());
        // Idempotent
        assert!(!registry.unregister("X"));
        assert!(!registry.unregister("never-registered"));
    }

    #[test]
    fn test_all_keeps_registration_order() {
        let registry = ImporterRegistry::new();
        for name in ["c", "a", "b"] {
            registry
                .register(Arc::new(StubImporter::value(name, 0.0)))
                .unwrap();
        }
        assert_eq!(names(&registry), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_register_same_name_replaces_in_place() {
        let registry = ImporterRegistry::new();
        registry
            .register(Arc::new(StubImporter::value("a", 1.0)))
            .unwrap();
        registry
            .register(Arc::new(StubImporter::value("b", 2.0)))
            .unwrap();
        registry
            .register(Arc::new(StubImporter::value("a", 3.0)))
            .unwrap();

        assert_eq!(names(&registry), vec!["a", "b"]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = ImporterRegistry::new();
        registry
            .register(Arc::new(StubImporter::value("a", 1.0)))
            .unwrap();
        let snapshot = registry.all();
        registry.unregister("a");
        assert_eq!(snapshot.len(), 1);
        assert!(registry.is_empty());
    }
}
