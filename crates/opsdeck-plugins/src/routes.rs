//! Route table and plugin route composition
//!
//! The host application owns a fixed route table. Plugin routes are grafted as
//! children of one host route, exactly once, after every plugin has been
//! installed. Route names are unique across the whole table.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use opsdeck_core::config::RoutesConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{Plugin, PluginError, PluginResult};

/// Lazily resolved reference to an opaque view
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentRef(String);

impl ComponentRef {
    pub fn lazy(specifier: impl Into<String>) -> Self {
        Self(specifier.into())
    }

    pub fn specifier(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    /// Menu entry to highlight instead of this route's own path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_menu: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteNode {
    pub path: String,
    pub name: String,
    pub component: ComponentRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default)]
    pub meta: RouteMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteNode>,
}

impl RouteNode {
    pub fn new(path: impl Into<String>, name: impl Into<String>, component: &str) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            component: ComponentRef::lazy(component),
            redirect: None,
            meta: RouteMeta::default(),
            children: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.meta.title = Some(title.into());
        self
    }

    pub fn with_active_menu(mut self, path: impl Into<String>) -> Self {
        self.meta.active_menu = Some(path.into());
        self
    }

    pub fn with_permission(mut self, code: impl Into<String>) -> Self {
        self.meta.permission = Some(code.into());
        self
    }

    pub fn with_redirect(mut self, path: impl Into<String>) -> Self {
        self.redirect = Some(path.into());
        self
    }

    pub fn with_children(mut self, children: Vec<RouteNode>) -> Self {
        self.children = children;
        self
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.push(&self.name);
        for child in &self.children {
            child.collect_names(out);
        }
    }
}

/// Join a route path onto its parent's full path (absolute paths stand alone)
fn join_path(parent: &str, path: &str) -> String {
    if path.starts_with('/') {
        return path.to_string();
    }
    let parent = parent.trim_end_matches('/');
    if path.is_empty() {
        return if parent.is_empty() { "/".to_string() } else { parent.to_string() };
    }
    format!("{}/{}", parent, path)
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Match a concrete path against a pattern; returns params and the static segment count
fn match_pattern(pattern: &str, path: &str) -> Option<(BTreeMap<String, String>, usize)> {
    let pattern = segments(pattern);
    let path = segments(path);
    if pattern.len() != path.len() {
        return None;
    }

    let mut params = BTreeMap::new();
    let mut statics = 0;
    for (expected, actual) in pattern.iter().zip(path.iter()) {
        if let Some(param) = expected.strip_prefix(':') {
            params.insert(param.to_string(), (*actual).to_string());
        } else if expected == actual {
            statics += 1;
        } else {
            return None;
        }
    }
    Some((params, statics))
}

/// Substitute `:param` segments of a pattern; the result has no trailing slash
fn fill_pattern(pattern: &str, params: &BTreeMap<String, String>) -> String {
    let filled: Vec<&str> = segments(pattern)
        .into_iter()
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => params.get(name).map(String::as_str).unwrap_or(segment),
            None => segment,
        })
        .collect();
    format!("/{}", filled.join("/"))
}

/// Result of resolving a URL path against the route table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMatch {
    pub name: String,
    pub pattern: String,
    pub chain: Vec<String>,
    pub params: BTreeMap<String, String>,
    pub component: ComponentRef,
    pub meta: RouteMeta,
    /// Menu path to highlight for this page
    pub active_menu: String,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteNode>,
    host_route: String,
}

impl RouteTable {
    /// Build the host table; `host_route` must name one of its routes
    pub fn new(host_route: impl Into<String>, routes: Vec<RouteNode>) -> PluginResult<Self> {
        let host_route = host_route.into();
        let table = Self { routes, host_route };

        let mut seen = HashSet::new();
        for name in table.names() {
            if !seen.insert(name) {
                return Err(PluginError::DuplicateRouteName(name.to_string()));
            }
        }
        if table.find(&table.host_route).is_none() {
            return Err(PluginError::UnknownHostRoute(table.host_route.clone()));
        }
        Ok(table)
    }

    pub fn host_route(&self) -> &str {
        &self.host_route
    }

    pub fn routes(&self) -> &[RouteNode] {
        &self.routes
    }

    /// Every route name, in pre-order
    pub fn names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for route in &self.routes {
            route.collect_names(&mut names);
        }
        names
    }

    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&RouteNode> {
        fn walk<'a>(nodes: &'a [RouteNode], name: &str) -> Option<&'a RouteNode> {
            for node in nodes {
                if node.name == name {
                    return Some(node);
                }
                if let Some(found) = walk(&node.children, name) {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.routes, name)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut RouteNode> {
        fn walk<'a>(nodes: &'a mut [RouteNode], name: &str) -> Option<&'a mut RouteNode> {
            for node in nodes {
                if node.name == name {
                    return Some(node);
                }
                if let Some(found) = walk(&mut node.children, name) {
                    return Some(found);
                }
            }
            None
        }
        walk(&mut self.routes, name)
    }

    /// Reject `routes` if any name collides with the table or with each other
    fn check_names(&self, routes: &[RouteNode]) -> PluginResult<()> {
        let mut seen: HashSet<&str> = self.names().into_iter().collect();
        let mut incoming = Vec::new();
        for route in routes {
            route.collect_names(&mut incoming);
        }
        for name in incoming {
            if !seen.insert(name) {
                return Err(PluginError::DuplicateRouteName(name.to_string()));
            }
        }
        Ok(())
    }

    /// Append `route` as a child of the route named `parent`
    pub fn add_route(&mut self, parent: &str, route: RouteNode) -> PluginResult<()> {
        self.check_names(std::slice::from_ref(&route))?;
        let parent_node = self
            .find_mut(parent)
            .ok_or_else(|| PluginError::UnknownHostRoute(parent.to_string()))?;
        debug!(parent = %parent, route = %route.name, "Adding route");
        parent_node.children.push(route);
        Ok(())
    }

    /// Every route with its full path, in pre-order
    pub fn flatten(&self) -> Vec<(String, &RouteNode)> {
        fn walk<'a>(nodes: &'a [RouteNode], parent: &str, out: &mut Vec<(String, &'a RouteNode)>) {
            for node in nodes {
                let full = join_path(parent, &node.path);
                out.push((full.clone(), node));
                walk(&node.children, &full, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.routes, "", &mut out);
        out
    }

    /// Resolve a concrete URL path to the best matching route
    ///
    /// Static segments outrank `:param` segments; ties go to the route
    /// declared first.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        fn walk<'a>(
            nodes: &'a [RouteNode],
            parent: &str,
            chain: &mut Vec<&'a RouteNode>,
            path: &str,
            best: &mut Option<(usize, String, Vec<&'a RouteNode>, BTreeMap<String, String>)>,
        ) {
            for node in nodes {
                let full = join_path(parent, &node.path);
                chain.push(node);
                if let Some((params, statics)) = match_pattern(&full, path) {
                    let better = best.as_ref().is_none_or(|(score, ..)| statics > *score);
                    if better {
                        *best = Some((statics, full.clone(), chain.clone(), params));
                    }
                }
                walk(&node.children, &full, chain, path, best);
                chain.pop();
            }
        }

        let mut best = None;
        walk(&self.routes, "", &mut Vec::new(), path, &mut best);

        let (_, pattern, chain, params) = best?;
        let leaf = chain.last()?;
        let active_menu = leaf
            .meta
            .active_menu
            .clone()
            .unwrap_or_else(|| fill_pattern(&pattern, &params));

        Some(RouteMatch {
            name: leaf.name.clone(),
            pattern,
            chain: chain.iter().map(|n| n.name.clone()).collect(),
            params,
            component: leaf.component.clone(),
            meta: leaf.meta.clone(),
            active_menu,
        })
    }
}

/// Outcome of grafting plugin routes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteGraft {
    pub registered: usize,
    /// Plugins whose routes were refused, with the reason
    pub rejected: Vec<(String, String)>,
}

/// Grafts plugin routes onto the host route, once
#[derive(Debug, Default)]
pub struct RouteComposer {
    registered: bool,
}

impl RouteComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Append every plugin route under the host route
    ///
    /// Each plugin's contribution is validated on its own before any of it is
    /// grafted. A plugin whose route names collide with the table (or with an
    /// earlier plugin) is rejected as a whole; the others are still grafted.
    /// Calling this again after a graft does nothing.
    pub fn register_plugin_routes<'a>(
        &mut self,
        plugins: impl IntoIterator<Item = &'a Arc<dyn Plugin>>,
        table: &mut RouteTable,
    ) -> PluginResult<RouteGraft> {
        let mut graft = RouteGraft::default();
        if self.registered {
            warn!("Plugin routes already registered, ignoring repeated call");
            return Ok(graft);
        }

        let host = table.host_route().to_string();
        for plugin in plugins {
            let Some(routes) = plugin.routes() else {
                continue;
            };
            if let Err(e) = table.check_names(&routes) {
                error!(plugin = %plugin.name(), error = %e, "Plugin routes rejected");
                graft.rejected.push((plugin.name().to_string(), e.to_string()));
                continue;
            }

            let count = routes.len();
            for route in routes {
                table.add_route(&host, route)?;
            }
            info!(plugin = %plugin.name(), routes = count, "Plugin routes registered");
            graft.registered += count;
        }

        self.registered = true;
        Ok(graft)
    }
}

/// Outcome of a navigation check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(String),
}

/// Before-navigation rule: anonymous users go to login, logged-in users skip it
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    login_path: String,
    home_path: String,
}

impl NavigationGuard {
    pub fn new(login_path: impl Into<String>, home_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
            home_path: home_path.into(),
        }
    }

    pub fn from_config(config: &RoutesConfig) -> Self {
        Self::new(config.login_path.clone(), config.home_path.clone())
    }

    pub fn check(&self, to: &str, authenticated: bool) -> Navigation {
        let to_login = to == self.login_path;
        match (to_login, authenticated) {
            (true, true) => Navigation::Redirect(self.home_path.clone()),
            (false, false) => Navigation::Redirect(self.login_path.clone()),
            _ => Navigation::Proceed,
        }
    }
}
