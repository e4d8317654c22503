//! Permission directive for render nodes
//!
//! A decision is taken once, when an element is attached. It does not follow
//! later permission changes; callers compare the recorded generation against
//! the store (`Attachment::is_stale`) and re-attach after a login or logout.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::store::PermissionStore;

/// Visibility decision for one attached element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    visible: bool,
    generation: u64,
}

impl Attachment {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The store has been loaded or cleared since this decision was taken
    pub fn is_stale(&self, store: &PermissionStore) -> bool {
        self.generation != store.generation()
    }
}

/// An element of a render tree, optionally gated by an action code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            permission: None,
            children: Vec::new(),
        }
    }

    pub fn gated(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            permission: Some(code.into()),
            ..Self::new(id)
        }
    }

    pub fn with_children(mut self, children: Vec<RenderNode>) -> Self {
        self.children = children;
        self
    }
}

/// Attach-time permission check (`v-permission` style)
pub struct PermissionDirective;

impl PermissionDirective {
    /// Decide whether an element gated by `code` stays in the render output
    pub fn attach(store: &PermissionStore, code: Option<&str>) -> Attachment {
        let visible = match code {
            Some(code) if !code.is_empty() => store.has_permission(code),
            _ => true,
        };
        Attachment {
            visible,
            generation: store.generation(),
        }
    }

    /// Remove every node the store does not permit, along with its subtree
    pub fn prune(nodes: Vec<RenderNode>, store: &PermissionStore) -> Vec<RenderNode> {
        nodes
            .into_iter()
            .filter_map(|mut node| {
                if !Self::attach(store, node.permission.as_deref()).is_visible() {
                    debug!(id = %node.id, "Removing unauthorized element");
                    return None;
                }
                node.children = Self::prune(node.children, store);
                Some(node)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::AuthorizedMenu;

    fn restricted_store() -> PermissionStore {
        let mut store = PermissionStore::new();
        store.load(&[AuthorizedMenu::action("user:create")], false);
        store
    }

    #[test]
    fn test_absent_or_empty_code_is_always_visible() {
        let store = restricted_store();
        assert!(PermissionDirective::attach(&store, None).is_visible());
        assert!(PermissionDirective::attach(&store, Some("")).is_visible());
    }

    #[test]
    fn test_attach_consults_store() {
        let store = restricted_store();
        assert!(PermissionDirective::attach(&store, Some("user:create")).is_visible());
        assert!(!PermissionDirective::attach(&store, Some("user:delete")).is_visible());
    }

    #[test]
    fn test_attach_before_load_is_visible() {
        let store = PermissionStore::new();
        assert!(PermissionDirective::attach(&store, Some("user:delete")).is_visible());
    }

    #[test]
    fn test_attachment_is_not_reactive() {
        let mut store = PermissionStore::new();
        let attachment = PermissionDirective::attach(&store, Some("user:delete"));
        assert!(!attachment.is_stale(&store));

        store.load(&[], false);
        assert!(attachment.is_visible());
        assert!(attachment.is_stale(&store));
        assert!(!PermissionDirective::attach(&store, Some("user:delete")).is_visible());
    }

    #[test]
    fn test_prune_removes_unauthorized_subtrees() {
        let store = restricted_store();
        let toolbar = RenderNode::new("toolbar").with_children(vec![
            RenderNode::gated("create", "user:create"),
            RenderNode::gated("delete", "user:delete")
                .with_children(vec![RenderNode::new("delete-icon")]),
            RenderNode::new("refresh"),
        ]);

        let pruned = PermissionDirective::prune(vec![toolbar], &store);
        let ids: Vec<&str> = pruned[0].children.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["create", "refresh"]);
    }
}
