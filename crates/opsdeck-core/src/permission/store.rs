//! Permission store for action codes
//!
//! Holds the action codes the current user may use. Until a payload has been
//! loaded every check answers "allowed" so first renders are not hidden while
//! the authorized menu is still in flight.

use std::collections::HashSet;

use tracing::{debug, info};

use super::payload::{AuthorizedMenu, MenuKind};

/// Set of allowed action codes plus an admin override
#[derive(Debug, Clone)]
pub struct PermissionStore {
    action_kind: MenuKind,
    codes: HashSet<String>,
    loaded: bool,
    is_admin: bool,
    generation: u64,
}

impl Default for PermissionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionStore {
    /// Create an unloaded store that extracts codes from `type == 3` nodes
    pub fn new() -> Self {
        Self::with_action_kind(MenuKind::ACTION)
    }

    /// Create an unloaded store with a custom action node kind
    pub fn with_action_kind(action_kind: MenuKind) -> Self {
        Self {
            action_kind,
            codes: HashSet::new(),
            loaded: false,
            is_admin: false,
            generation: 0,
        }
    }

    /// Replace the permission set with the codes found in `tree`
    pub fn load(&mut self, tree: &[AuthorizedMenu], is_admin: bool) {
        self.codes.clear();
        self.is_admin = is_admin;
        self.extract(tree);
        self.loaded = true;
        self.generation += 1;

        info!(
            codes = self.codes.len(),
            is_admin,
            generation = self.generation,
            "Permissions loaded"
        );
    }

    fn extract(&mut self, nodes: &[AuthorizedMenu]) {
        for node in nodes {
            if node.kind == self.action_kind && !node.code.is_empty() {
                debug!(code = %node.code, "Allowing action code");
                self.codes.insert(node.code.clone());
            }
            if !node.children.is_empty() {
                self.extract(&node.children);
            }
        }
    }

    /// Whether `code` may be used by the current user
    pub fn has_permission(&self, code: &str) -> bool {
        if !self.loaded || self.is_admin {
            return true;
        }
        self.codes.contains(code)
    }

    /// Reset to the unloaded, empty, non-admin state
    pub fn clear(&mut self) {
        self.codes.clear();
        self.loaded = false;
        self.is_admin = false;
        self.generation += 1;

        info!(generation = self.generation, "Permissions cleared");
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Bumped on every load and clear
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Allowed codes, sorted
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.codes.iter().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_tree() -> Vec<AuthorizedMenu> {
        vec![
            AuthorizedMenu::menu("Users", "/users", 1).with_children(vec![
                AuthorizedMenu::action("user:delete"),
                AuthorizedMenu::action("user:create"),
            ]),
            AuthorizedMenu::menu("Roles", "/roles", 2)
                .with_children(vec![AuthorizedMenu::action("role:edit")]),
        ]
    }

    #[test]
    fn test_unloaded_store_fails_open() {
        let store = PermissionStore::new();
        assert!(!store.is_loaded());
        assert!(store.has_permission("user:delete"));
        assert!(store.has_permission("anything"));
    }

    #[test]
    fn test_load_restricts_to_action_codes() {
        let mut store = PermissionStore::new();
        store.load(&[AuthorizedMenu::action("user:delete")], false);

        assert!(store.has_permission("user:delete"));
        assert!(!store.has_permission("user:export"));
    }

    #[test]
    fn test_load_walks_nested_children() {
        let mut store = PermissionStore::new();
        store.load(&user_tree(), false);

        assert_eq!(store.codes(), vec!["role:edit", "user:create", "user:delete"]);
    }

    #[test]
    fn test_only_action_nodes_contribute() {
        let mut menu = AuthorizedMenu::menu("Users", "/users", 1);
        menu.code = "system:user".to_string();
        let empty_action = AuthorizedMenu::action("");

        let mut store = PermissionStore::new();
        store.load(&[menu, empty_action], false);

        assert!(!store.has_permission("system:user"));
        assert!(!store.has_permission(""));
        assert!(store.codes().is_empty());
    }

    #[test]
    fn test_hidden_nodes_still_contribute() {
        let mut hidden = AuthorizedMenu::menu("Audit", "/audit", 9);
        hidden.visible = 0;
        let hidden = hidden.with_children(vec![AuthorizedMenu::action("audit:export")]);

        let mut store = PermissionStore::new();
        store.load(&[hidden], false);
        assert!(store.has_permission("audit:export"));
    }

    #[test]
    fn test_admin_allows_everything() {
        let mut store = PermissionStore::new();
        store.load(&[], true);

        assert!(store.is_admin());
        assert!(store.has_permission("user:delete"));
        assert!(store.has_permission("never:granted"));
    }

    #[test]
    fn test_load_replaces_previous_session() {
        let mut store = PermissionStore::new();
        store.load(&user_tree(), false);
        store.load(&[AuthorizedMenu::action("user:export")], false);

        assert!(store.has_permission("user:export"));
        assert!(!store.has_permission("user:delete"));
        assert!(!store.has_permission("role:edit"));
    }

    #[test]
    fn test_clear_returns_to_fail_open_then_restricts_again() {
        let mut store = PermissionStore::new();
        store.load(&user_tree(), true);
        store.clear();

        assert!(!store.is_loaded());
        assert!(!store.is_admin());
        assert!(store.has_permission("user:delete"));

        store.load(&[AuthorizedMenu::action("user:create")], false);
        assert!(store.has_permission("user:create"));
        assert!(!store.has_permission("user:delete"));
        assert!(!store.has_permission("role:edit"));
    }

    #[test]
    fn test_generation_changes_on_load_and_clear() {
        let mut store = PermissionStore::new();
        assert_eq!(store.generation(), 0);
        store.load(&[], false);
        assert_eq!(store.generation(), 1);
        store.clear();
        assert_eq!(store.generation(), 2);
    }

    #[test]
    fn test_custom_action_kind() {
        let mut node = AuthorizedMenu::action("job:run");
        node.kind = MenuKind(4);

        let mut store = PermissionStore::with_action_kind(MenuKind(4));
        store.load(&[node, AuthorizedMenu::action("user:delete")], false);

        assert!(store.has_permission("job:run"));
        assert!(!store.has_permission("user:delete"));
    }
}
