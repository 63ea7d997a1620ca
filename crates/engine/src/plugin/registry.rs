//! Plugin Registry.
//!
//! An ordered collection of processor plugins keyed by unique id. A host
//! populates one at startup and may install it process-wide with
//! [`install_global`]; after that it is read-only. The step controller only
//! ever receives a plugin reference and never touches the registry.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tracing::debug;

use super::ProcessorPlugin;

/// Error produced during plugin registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A plugin with this id is already registered.
    #[error("plugin '{0}' is already registered")]
    DuplicateId(String),

    /// The process-wide registry was already installed.
    #[error("global plugin registry is already installed")]
    AlreadyInstalled,
}

/// Ordered collection of plugins with unique ids.
#[derive(Default)]
pub struct PluginRegistry {
    /// Plugins in registration order.
    plugins: Vec<Arc<dyn ProcessorPlugin>>,
    /// Id → index into `plugins`.
    id_map: HashMap<String, usize>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin at the end of the list.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateId` if the id is already taken.
    pub fn register(&mut self, plugin: Arc<dyn ProcessorPlugin>) -> Result<(), RegistryError> {
        let id = plugin.descriptor().id.clone();
        if self.id_map.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }
        debug!(plugin = %id, "registered processor plugin");
        let _ = self.id_map.insert(id, self.plugins.len());
        self.plugins.push(plugin);
        Ok(())
    }

    /// Looks up a plugin by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn ProcessorPlugin>> {
        self.id_map.get(id).map(|&idx| Arc::clone(&self.plugins[idx]))
    }

    /// Iterates over plugins in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ProcessorPlugin>> {
        self.plugins.iter()
    }

    /// Returns plugin ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|p| p.descriptor().id.as_str())
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` if no plugins are registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

static GLOBAL: OnceLock<PluginRegistry> = OnceLock::new();

/// Installs `registry` as the process-wide registry.
///
/// # Errors
///
/// Returns `RegistryError::AlreadyInstalled` if a registry was installed before;
/// the existing one is kept.
pub fn install_global(registry: PluginRegistry) -> Result<&'static PluginRegistry, RegistryError> {
    GLOBAL
        .set(registry)
        .map_err(|_| RegistryError::AlreadyInstalled)?;
    GLOBAL.get().ok_or(RegistryError::AlreadyInstalled)
}

/// Returns the process-wide registry, if one has been installed.
pub fn global() -> Option<&'static PluginRegistry> {
    GLOBAL.get()
}
