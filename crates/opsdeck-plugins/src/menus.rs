//! Navigation menu composition
//!
//! Menu entries arrive flat: first the authorized menu from the server (in
//! pre-order), then every plugin's contribution in registry order. The tree is
//! rebuilt from `parent_path` links, and siblings are ordered by `sort` with
//! ties kept in arrival order.

use std::collections::HashMap;
use std::sync::Arc;

use opsdeck_core::permission::{AuthorizedMenu, PermissionStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{Plugin, PluginError, PluginResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub sort: i32,
    #[serde(default)]
    pub hidden: bool,
    /// Empty for root entries
    #[serde(default)]
    pub parent_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
}

impl MenuNode {
    pub fn root(name: impl Into<String>, path: impl Into<String>, sort: i32) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            icon: String::new(),
            sort,
            hidden: false,
            parent_path: String::new(),
            permission: None,
        }
    }

    pub fn child(
        name: impl Into<String>,
        path: impl Into<String>,
        parent_path: impl Into<String>,
        sort: i32,
    ) -> Self {
        Self {
            parent_path: parent_path.into(),
            ..Self::root(name, path, sort)
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_permission(mut self, code: impl Into<String>) -> Self {
        self.permission = Some(code.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_path.is_empty()
    }

    /// Flatten the navigable part of an authorized menu tree
    ///
    /// Action nodes are skipped. Entries without a path cannot be linked, so
    /// their children are attached to the nearest ancestor that has one.
    pub fn from_authorized(tree: &[AuthorizedMenu]) -> Vec<MenuNode> {
        fn walk(nodes: &[AuthorizedMenu], parent: &str, out: &mut Vec<MenuNode>) {
            for node in nodes {
                if !node.kind.is_navigable() {
                    continue;
                }
                if node.path.is_empty() {
                    warn!(name = %node.name, "Authorized menu entry has no path, lifting its children");
                    walk(&node.children, parent, out);
                    continue;
                }
                out.push(MenuNode {
                    name: node.name.clone(),
                    path: node.path.clone(),
                    icon: node.icon.clone(),
                    sort: node.sort,
                    hidden: !node.is_visible(),
                    parent_path: parent.to_string(),
                    permission: None,
                });
                walk(&node.children, &node.path, out);
            }
        }

        let mut out = Vec::new();
        walk(tree, "", &mut out);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    #[serde(flatten)]
    pub node: MenuNode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    fn count(&self) -> usize {
        1 + self.children.iter().map(MenuItem::count).sum::<usize>()
    }
}

/// Composed navigation tree, including hidden entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MenuTree {
    roots: Vec<MenuItem>,
}

impl MenuTree {
    /// Rebuild a tree from flat nodes linked by `parent_path`
    pub fn build(nodes: Vec<MenuNode>) -> PluginResult<Self> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.path.as_str(), i).is_some() {
                return Err(PluginError::DuplicateMenuPath(node.path.clone()));
            }
        }

        let mut roots = Vec::new();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            if node.is_root() {
                roots.push(i);
                continue;
            }
            match index.get(node.parent_path.as_str()) {
                Some(&parent) if parent == i => {
                    return Err(PluginError::MenuCycle(node.path.clone()));
                }
                Some(&parent) => children[parent].push(i),
                None => {
                    return Err(PluginError::OrphanMenu {
                        path: node.path.clone(),
                        parent_path: node.parent_path.clone(),
                    });
                }
            }
        }

        // Stable: equal `sort` keeps arrival order
        roots.sort_by_key(|&i| nodes[i].sort);
        for list in &mut children {
            list.sort_by_key(|&i| nodes[i].sort);
        }

        let total = nodes.len();
        let mut slots: Vec<Option<MenuNode>> = nodes.into_iter().map(Some).collect();

        fn attach(i: usize, slots: &mut [Option<MenuNode>], children: &[Vec<usize>]) -> Option<MenuItem> {
            let node = slots[i].take()?;
            let kids = children[i]
                .iter()
                .filter_map(|&c| attach(c, slots, children))
                .collect();
            Some(MenuItem {
                node,
                children: kids,
            })
        }

        let roots: Vec<MenuItem> = roots
            .iter()
            .filter_map(|&i| attach(i, &mut slots, &children))
            .collect();

        // Anything left over hangs off a parent chain that loops back on itself
        if let Some(stray) = slots.iter().flatten().next() {
            return Err(PluginError::MenuCycle(stray.path.clone()));
        }

        let tree = Self { roots };
        debug_assert_eq!(tree.len(), total);
        Ok(tree)
    }

    pub fn roots(&self) -> &[MenuItem] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.roots.iter().map(MenuItem::count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn find(&self, path: &str) -> Option<&MenuItem> {
        self.breadcrumb_items(path).and_then(|chain| chain.last().copied())
    }

    /// Labels from the root down to the entry at `path`
    pub fn breadcrumb(&self, path: &str) -> Vec<&str> {
        self.breadcrumb_items(path)
            .map(|chain| chain.iter().map(|item| item.node.name.as_str()).collect())
            .unwrap_or_default()
    }

    fn breadcrumb_items(&self, path: &str) -> Option<Vec<&MenuItem>> {
        fn walk<'a>(items: &'a [MenuItem], path: &str, chain: &mut Vec<&'a MenuItem>) -> bool {
            for item in items {
                chain.push(item);
                if item.node.path == path || walk(&item.children, path, chain) {
                    return true;
                }
                chain.pop();
            }
            false
        }

        let mut chain = Vec::new();
        walk(&self.roots, path, &mut chain).then_some(chain)
    }

    /// The rendered menu: hidden and unauthorized entries are left out with their subtrees
    pub fn visible(&self, store: &PermissionStore) -> Vec<MenuItem> {
        fn filter(items: &[MenuItem], store: &PermissionStore) -> Vec<MenuItem> {
            items
                .iter()
                .filter(|item| !item.node.hidden)
                .filter(|item| match item.node.permission.as_deref() {
                    Some(code) if !code.is_empty() => store.has_permission(code),
                    _ => true,
                })
                .map(|item| MenuItem {
                    node: item.node.clone(),
                    children: filter(&item.children, store),
                })
                .collect()
        }
        filter(&self.roots, store)
    }
}

impl PluginError {
    /// Menu path an integrity error points at
    fn menu_path(&self) -> Option<&str> {
        match self {
            Self::OrphanMenu { path, .. } | Self::DuplicateMenuPath(path) | Self::MenuCycle(path) => {
                Some(path)
            }
            _ => None,
        }
    }
}

/// Composed menu plus the plugin contributions that were refused
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComposedMenu {
    pub tree: MenuTree,
    pub rejected: Vec<(String, String)>,
}

/// Merges the authorized menu with plugin menus into one tree
pub struct MenuComposer;

impl MenuComposer {
    /// Build the session menu
    ///
    /// A plugin whose entries break the tree (orphan, duplicate path or
    /// cycle) is dropped as a whole and the tree is rebuilt without it. A
    /// broken authorized menu is still an error.
    pub fn compose<'a>(
        authorized: &[AuthorizedMenu],
        plugins: impl IntoIterator<Item = &'a Arc<dyn Plugin>>,
    ) -> PluginResult<ComposedMenu> {
        // `None` owner marks entries from the server
        let mut sources: Vec<(Option<String>, MenuNode)> = MenuNode::from_authorized(authorized)
            .into_iter()
            .map(|node| (None, node))
            .collect();
        let server_count = sources.len();

        for plugin in plugins {
            if let Some(menus) = plugin.menus() {
                debug!(plugin = %plugin.name(), entries = menus.len(), "Collecting plugin menus");
                let owner = plugin.name().to_string();
                sources.extend(menus.into_iter().map(|node| (Some(owner.clone()), node)));
            }
        }

        let mut rejected = Vec::new();
        loop {
            let nodes = sources.iter().map(|(_, node)| node.clone()).collect();
            let e = match MenuTree::build(nodes) {
                Ok(tree) => {
                    info!(
                        entries = tree.len(),
                        from_server = server_count,
                        rejected = rejected.len(),
                        "Menu tree composed"
                    );
                    return Ok(ComposedMenu { tree, rejected });
                }
                Err(e) => e,
            };

            // The later of two duplicates is the offender
            let owner = e.menu_path().and_then(|path| {
                sources
                    .iter()
                    .rev()
                    .find(|(_, node)| node.path == path)
                    .and_then(|(owner, _)| owner.clone())
            });
            let Some(owner) = owner else {
                error!(error = %e, "Authorized menu is inconsistent");
                return Err(e);
            };

            error!(plugin = %owner, error = %e, "Plugin menus rejected");
            sources.retain(|(o, _)| o.as_deref() != Some(owner.as_str()));
            rejected.push((owner, e.to_string()));
        }
    }
}
