use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::error::RegistryError;
use crate::domain::View;

/// Views keyed by name.
///
/// Populated during setup and read afterwards. There is no removal.
#[derive(Debug, Default)]
pub struct ViewRegistry {
    views: RwLock<HashMap<String, Arc<View>>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register views in order.
    ///
    /// Not transactional: on an empty name, views before the offending one stay
    /// registered. A view whose name is already registered replaces the old one.
    pub fn register<I>(&self, views: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = View>,
    {
        for view in views {
            if view.name.is_empty() {
                return Err(RegistryError::InvalidName { kind: "View" });
            }
            tracing::debug!(view = %view, "Registering view");
            let mut map = self.views.write();
            if map.insert(view.name.clone(), Arc::new(view)).is_some() {
                tracing::debug!("Replaced previously registered view");
            }
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<View>> {
        self.views.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.views.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.views.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.read().is_empty()
    }
}
