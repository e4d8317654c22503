//! Console context
//!
//! One `Console` per running application. It owns the plugin registry, the
//! lifecycle controller, the route table, the permission store and the
//! composed menu, and sequences them. Routes are grafted only after every
//! install hook resolved. Login drops the previous session before it waits
//! for the authorized menu, so a failed login never leaves old permissions
//! behind.

use std::sync::Arc;

use opsdeck_core::config::Config;
use opsdeck_core::permission::{MenuKind, MenuSource, PermissionStore};
use serde::Serialize;
use tracing::info;

use crate::lifecycle::{LifecycleController, LifecycleReport, PluginState};
use crate::menus::{MenuComposer, MenuItem, MenuTree};
use crate::registry::PluginManager;
use crate::routes::{
    Navigation, NavigationGuard, RouteComposer, RouteGraft, RouteMatch, RouteTable,
};
use crate::{Plugin, PluginError, PluginInfo, PluginResult};

#[derive(Debug, Clone, Serialize)]
pub struct StartupReport {
    pub lifecycle: LifecycleReport,
    pub routes_registered: usize,
    /// Plugins whose routes were refused, with the reason
    pub routes_rejected: Vec<(String, String)>,
}

#[derive(Debug)]
pub struct Console {
    registry: PluginManager,
    lifecycle: LifecycleController,
    route_composer: RouteComposer,
    routes: RouteTable,
    guard: NavigationGuard,
    permissions: PermissionStore,
    menu: Option<MenuTree>,
    menus_rejected: Vec<(String, String)>,
}

impl Console {
    pub fn new(config: &Config, routes: RouteTable) -> Self {
        Self {
            registry: PluginManager::new(),
            lifecycle: LifecycleController::from_config(&config.plugins),
            route_composer: RouteComposer::new(),
            routes,
            guard: NavigationGuard::from_config(&config.routes),
            permissions: PermissionStore::with_action_kind(MenuKind(
                config.permissions.action_kind,
            )),
            menu: None,
            menus_rejected: Vec::new(),
        }
    }

    /// Register a plugin; see `PluginManager::register` for replacement rules
    ///
    /// An installed plugin cannot be replaced, since the new descriptor's
    /// install hook never ran. Disable it first.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> PluginResult<bool> {
        if self.lifecycle.is_enabled(plugin.name()) {
            return Err(PluginError::InvalidState(format!(
                "plugin '{}' is installed and cannot be replaced",
                plugin.name()
            )));
        }
        Ok(self.registry.register(plugin))
    }

    pub fn plugins(&self) -> &PluginManager {
        &self.registry
    }

    pub fn lifecycle(&self) -> &LifecycleController {
        &self.lifecycle
    }

    pub fn plugin_state(&self, name: &str) -> PluginState {
        self.lifecycle.state(name)
    }

    pub fn plugin_infos(&self) -> Vec<PluginInfo> {
        self.registry
            .iter()
            .map(|p| PluginInfo::from_plugin(p.as_ref(), self.lifecycle.is_enabled(p.name())))
            .collect()
    }

    pub fn plugin_info(&self, name: &str) -> PluginResult<PluginInfo> {
        let plugin = self
            .registry
            .get(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;
        Ok(PluginInfo::from_plugin(
            plugin.as_ref(),
            self.lifecycle.is_enabled(name),
        ))
    }

    fn enabled_plugins(&self) -> Vec<Arc<dyn Plugin>> {
        self.registry
            .iter()
            .filter(|p| self.lifecycle.is_enabled(p.name()))
            .cloned()
            .collect()
    }

    /// Install every plugin, then graft the routes of the installed ones
    pub async fn start(&mut self) -> PluginResult<StartupReport> {
        let lifecycle = self.lifecycle.install_all(&self.registry).await;
        let graft = self.register_plugin_routes()?;

        info!(
            plugins = self.registry.len(),
            routes = graft.registered,
            rejected = graft.rejected.len(),
            "Console started"
        );
        Ok(StartupReport {
            lifecycle,
            routes_registered: graft.registered,
            routes_rejected: graft.rejected,
        })
    }

    /// Graft routes of installed plugins under the host route (once)
    pub fn register_plugin_routes(&mut self) -> PluginResult<RouteGraft> {
        if !self.lifecycle.has_started() {
            return Err(PluginError::InvalidState(
                "plugin routes requested before plugins were installed".to_string(),
            ));
        }
        let enabled = self.enabled_plugins();
        self.route_composer
            .register_plugin_routes(enabled.iter(), &mut self.routes)
    }

    /// Enable one plugin at runtime
    ///
    /// Routes are grafted once at startup, so a plugin enabled later only
    /// contributes menu entries from the next login on.
    pub async fn enable(&mut self, name: &str) -> PluginResult<()> {
        self.lifecycle.install(&self.registry, name).await
    }

    /// Disable one plugin at runtime
    pub async fn disable(&mut self, name: &str) -> PluginResult<()> {
        self.lifecycle.uninstall(&self.registry, name).await
    }

    /// Load permissions from the authorized menu, then compose the menu tree
    pub async fn login(
        &mut self,
        source: &dyn MenuSource,
        is_admin: bool,
    ) -> PluginResult<&MenuTree> {
        self.clear_session();
        let authorized = source.authorized_menu().await?;
        self.permissions.load(&authorized, is_admin);

        let enabled = self.enabled_plugins();
        let composed = MenuComposer::compose(&authorized, enabled.iter())?;
        self.menus_rejected = composed.rejected;
        Ok(&*self.menu.insert(composed.tree))
    }

    /// Drop the session's permissions and menu
    pub fn logout(&mut self) {
        self.clear_session();
        info!("Session cleared");
    }

    fn clear_session(&mut self) {
        self.permissions.clear();
        self.menu = None;
        self.menus_rejected.clear();
    }

    pub fn permissions(&self) -> &PermissionStore {
        &self.permissions
    }

    pub fn has_permission(&self, code: &str) -> bool {
        self.permissions.has_permission(code)
    }

    /// Composed menu for the current session, hidden entries included
    pub fn menu(&self) -> Option<&MenuTree> {
        self.menu.as_ref()
    }

    /// Plugins whose menu entries were left out of the current session's menu
    pub fn rejected_menus(&self) -> &[(String, String)] {
        &self.menus_rejected
    }

    /// Rendered menu for the current session
    pub fn visible_menu(&self) -> Vec<MenuItem> {
        self.menu
            .as_ref()
            .map(|tree| tree.visible(&self.permissions))
            .unwrap_or_default()
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        self.routes.resolve(path)
    }

    pub fn navigate(&self, to: &str, authenticated: bool) -> Navigation {
        self.guard.check(to, authenticated)
    }

    /// Uninstall every installed plugin
    pub async fn shutdown(&mut self) -> LifecycleReport {
        self.logout();
        self.lifecycle.uninstall_all(&self.registry).await
    }
}
