//! Plugin registry
//!
//! Iteration order is first-registration order; lifecycle, route and menu
//! composition all walk plugins in this order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::Plugin;

#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Arc<dyn Plugin>>,
    index: HashMap<String, usize>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin under its name
    ///
    /// Re-registering a name replaces the descriptor in place and keeps its
    /// original position. Returns `true` when an entry was replaced.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> bool {
        let name = plugin.name().to_string();

        if let Some(&slot) = self.index.get(&name) {
            warn!(
                plugin = %name,
                version = %plugin.version(),
                "Plugin already registered, replacing previous descriptor"
            );
            self.plugins[slot] = plugin;
            return true;
        }

        info!(plugin = %name, version = %plugin.version(), "Plugin registered");
        self.index.insert(name, self.plugins.len());
        self.plugins.push(plugin);
        false
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.index.get(name).map(|&slot| Arc::clone(&self.plugins[slot]))
    }

    pub fn get_all(&self) -> Vec<Arc<dyn Plugin>> {
        self.plugins.clone()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<dyn Plugin>> {
        self.plugins.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginManager")
            .field("plugins", &self.names())
            .finish()
    }
}
