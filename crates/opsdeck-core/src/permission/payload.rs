//! Authorized menu payload delivered by the server

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Menu node kind (`type` on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuKind(pub u8);

impl MenuKind {
    pub const DIRECTORY: MenuKind = MenuKind(1);
    pub const MENU: MenuKind = MenuKind(2);
    pub const ACTION: MenuKind = MenuKind(3);

    /// Directories and menus become navigation entries; everything else does not
    pub fn is_navigable(self) -> bool {
        self == Self::DIRECTORY || self == Self::MENU
    }
}

impl Default for MenuKind {
    fn default() -> Self {
        Self::MENU
    }
}

fn default_visible() -> u8 {
    1
}

// Leaf nodes come back with `"children": null`
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<AuthorizedMenu>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<AuthorizedMenu>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One node of the authorized menu tree returned for the current user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorizedMenu {
    pub id: u64,
    pub name: String,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: MenuKind,
    pub path: String,
    pub component: String,
    pub icon: String,
    pub sort: i32,
    pub visible: u8,
    #[serde(deserialize_with = "null_as_empty")]
    pub children: Vec<AuthorizedMenu>,
}

impl Default for AuthorizedMenu {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            code: String::new(),
            kind: MenuKind::default(),
            path: String::new(),
            component: String::new(),
            icon: String::new(),
            sort: 0,
            visible: default_visible(),
            children: Vec::new(),
        }
    }
}

impl AuthorizedMenu {
    /// Create a navigable menu entry
    pub fn menu(name: impl Into<String>, path: impl Into<String>, sort: i32) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: MenuKind::MENU,
            sort,
            ..Default::default()
        }
    }

    /// Create a button/action node carrying an action code
    pub fn action(code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            name: code.clone(),
            code,
            kind: MenuKind::ACTION,
            ..Default::default()
        }
    }

    pub fn with_children(mut self, children: Vec<AuthorizedMenu>) -> Self {
        self.children = children;
        self
    }

    pub fn is_visible(&self) -> bool {
        self.visible != 0
    }

    /// Parse a payload, accepting either a bare array or a `{"data": [...]}` envelope
    pub fn parse_tree(json: &str) -> Result<Vec<AuthorizedMenu>> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let nodes = match value {
            serde_json::Value::Array(_) => value,
            serde_json::Value::Object(mut map) => map.remove("data").ok_or_else(|| {
                Error::InvalidPayload("expected an array or an object with `data`".to_string())
            })?,
            _ => {
                return Err(Error::InvalidPayload(
                    "expected an array of menu nodes".to_string(),
                ));
            }
        };
        Ok(serde_json::from_value(nodes)?)
    }
}

/// Source of the authorized menu tree for the logged-in user
#[async_trait]
pub trait MenuSource: Send + Sync {
    async fn authorized_menu(&self) -> Result<Vec<AuthorizedMenu>>;
}

/// A menu source that hands out a fixed tree
#[derive(Debug, Clone, Default)]
pub struct StaticMenuSource {
    tree: Vec<AuthorizedMenu>,
}

impl StaticMenuSource {
    pub fn new(tree: Vec<AuthorizedMenu>) -> Self {
        Self { tree }
    }
}

#[async_trait]
impl MenuSource for StaticMenuSource {
    async fn authorized_menu(&self) -> Result<Vec<AuthorizedMenu>> {
        Ok(self.tree.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array() {
        let json = r#"[
            {"id": 1, "name": "System", "type": 1, "path": "/system", "children": [
                {"id": 2, "name": "Users", "type": 2, "path": "/users", "sort": 1, "children": [
                    {"id": 3, "name": "Delete", "type": 3, "code": "user:delete", "children": null}
                ]}
            ]}
        ]"#;

        let tree = AuthorizedMenu::parse_tree(json).expect("parse");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].kind, MenuKind::DIRECTORY);
        assert!(tree[0].is_visible());

        let action = &tree[0].children[0].children[0];
        assert_eq!(action.kind, MenuKind::ACTION);
        assert_eq!(action.code, "user:delete");
        assert!(action.children.is_empty());
    }

    #[test]
    fn test_parse_data_envelope_and_unknown_fields() {
        let json = r#"{"data": [{"name": "Roles", "type": 2, "path": "/roles",
                        "visible": 0, "status": 1, "parentId": 0}]}"#;

        let tree = AuthorizedMenu::parse_tree(json).expect("parse");
        assert_eq!(tree[0].path, "/roles");
        assert!(!tree[0].is_visible());
    }

    #[test]
    fn test_parse_rejects_scalars() {
        let err = AuthorizedMenu::parse_tree("42").unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)));

        let err = AuthorizedMenu::parse_tree(r#"{"items": []}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)));
    }

    #[test]
    fn test_kind_navigable() {
        assert!(MenuKind::DIRECTORY.is_navigable());
        assert!(MenuKind::MENU.is_navigable());
        assert!(!MenuKind::ACTION.is_navigable());
        assert!(!MenuKind(9).is_navigable());
    }

    #[tokio::test]
    async fn test_static_source_returns_tree() {
        let source = StaticMenuSource::new(vec![AuthorizedMenu::action("user:export")]);
        let tree = source.authorized_menu().await.expect("tree");
        assert_eq!(tree[0].code, "user:export");
    }
}
