//! OpsDeck Plugin System
//!
//! Feature modules plug into the console shell through:
//! - Plugin registration in first-registration order
//! - Sequential install/uninstall with per-plugin failure isolation
//! - One-shot grafting of plugin routes under the host route
//! - Menu tree composition from the authorized menu and plugin menus

pub mod console;
pub mod lifecycle;
pub mod menus;
pub mod registry;
pub mod routes;

use async_trait::async_trait;
use thiserror::Error;

pub use console::{Console, StartupReport};
pub use lifecycle::{LifecycleController, LifecycleReport, PluginState};
pub use menus::{ComposedMenu, MenuComposer, MenuItem, MenuNode, MenuTree};
pub use registry::PluginManager;
pub use routes::{
    ComponentRef, Navigation, NavigationGuard, RouteComposer, RouteGraft, RouteMatch, RouteMeta,
    RouteNode, RouteTable,
};

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Plugin not found: {0}")]
    NotFound(String),

    #[error("Plugin '{0}' failed to install: {1}")]
    InstallFailed(String, String),

    #[error("Plugin '{0}' failed to uninstall: {1}")]
    UninstallFailed(String, String),

    #[error("Plugin '{0}' hook timed out after {1} seconds")]
    HookTimeout(String, u64),

    #[error("Route name '{0}' is already registered")]
    DuplicateRouteName(String),

    #[error("Host route '{0}' does not exist")]
    UnknownHostRoute(String),

    #[error("Menu '{path}' references missing parent '{parent_path}'")]
    OrphanMenu { path: String, parent_path: String },

    #[error("Menu path '{0}' is contributed more than once")]
    DuplicateMenuPath(String),

    #[error("Menu parent chain through '{0}' never reaches a root")]
    MenuCycle(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Core(#[from] opsdeck_core::Error),
}

pub type PluginResult<T> = Result<T, PluginError>;

/// A feature module contributing menus and routes to the console
///
/// Contributions are optional capabilities: `None` means the plugin does not
/// contribute that kind of entry at all.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn version(&self) -> &str;

    fn author(&self) -> &str;

    async fn install(&self) -> PluginResult<()>;

    async fn uninstall(&self) -> PluginResult<()>;

    fn menus(&self) -> Option<Vec<MenuNode>> {
        None
    }

    fn routes(&self) -> Option<Vec<RouteNode>> {
        None
    }
}

/// Plugin listing entry for administrative views
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    pub enabled: bool,
}

impl PluginInfo {
    pub fn from_plugin(plugin: &dyn Plugin, enabled: bool) -> Self {
        Self {
            name: plugin.name().to_string(),
            description: plugin.description().to_string(),
            version: plugin.version().to_string(),
            author: plugin.author().to_string(),
            enabled,
        }
    }
}

#[cfg(test)]
mod lib_tests;
