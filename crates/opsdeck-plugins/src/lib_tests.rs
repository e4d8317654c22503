//! Plugin system tests

use std::sync::Arc;

use async_trait::async_trait;

use crate::{MenuNode, Plugin, PluginError, PluginInfo, PluginManager, PluginResult, RouteNode};

struct Fixture {
    name: &'static str,
    version: &'static str,
    menus: Option<Vec<MenuNode>>,
}

impl Fixture {
    fn new(name: &'static str, version: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            version,
            menus: None,
        })
    }
}

#[async_trait]
impl Plugin for Fixture {
    fn name(&self) -> &str {
        self.name
    }
    fn description(&self) -> &str {
        "fixture plugin"
    }
    fn version(&self) -> &str {
        self.version
    }
    fn author(&self) -> &str {
        "J"
    }
    async fn install(&self) -> PluginResult<()> {
        Ok(())
    }
    async fn uninstall(&self) -> PluginResult<()> {
        Ok(())
    }
    fn menus(&self) -> Option<Vec<MenuNode>> {
        self.menus.clone()
    }
}

#[test]
fn test_register_preserves_first_registration_order() {
    let mut manager = PluginManager::new();
    assert!(manager.is_empty());

    manager.register(Fixture::new("kubernetes", "1.0.0"));
    manager.register(Fixture::new("monitor", "1.0.0"));
    manager.register(Fixture::new("task", "1.0.0"));

    assert_eq!(manager.names(), vec!["kubernetes", "monitor", "task"]);
    assert_eq!(manager.len(), 3);
}

#[test]
fn test_reregister_replaces_in_place() {
    let mut manager = PluginManager::new();
    assert!(!manager.register(Fixture::new("kubernetes", "1.0.0")));
    assert!(!manager.register(Fixture::new("task", "1.0.0")));
    assert!(manager.register(Fixture::new("kubernetes", "2.0.0")));

    assert_eq!(manager.names(), vec!["kubernetes", "task"]);
    let replaced = manager.get("kubernetes").expect("registered");
    assert_eq!(replaced.version(), "2.0.0");
    assert_eq!(manager.get_all()[0].version(), "2.0.0");
}

#[test]
fn test_get_missing_plugin() {
    let manager = PluginManager::new();
    assert!(manager.get("nope").is_none());
    assert!(!manager.contains("nope"));
}

#[test]
fn test_optional_capabilities_default_to_none() {
    let plugin = Fixture::new("bare", "0.1.0");
    assert!(plugin.menus().is_none());
    assert!(plugin.routes().is_none());

    let with_menus = Fixture {
        name: "menus",
        version: "0.1.0",
        menus: Some(vec![MenuNode::root("Menus", "/menus", 1)]),
    };
    assert_eq!(with_menus.menus().map(|m| m.len()), Some(1));
}

#[test]
fn test_plugin_info_serialization() {
    let plugin = Fixture::new("task", "1.0.0");
    let info = PluginInfo::from_plugin(plugin.as_ref(), true);

    let json = serde_json::to_value(&info).expect("serialize");
    assert_eq!(json["name"], "task");
    assert_eq!(json["version"], "1.0.0");
    assert_eq!(json["author"], "J");
    assert_eq!(json["enabled"], true);
}

#[test]
fn test_menu_node_json_contract() {
    let json = r#"{"name": "Clusters", "path": "/kubernetes/clusters", "icon": "OfficeBuilding",
                   "sort": 1, "hidden": false, "parentPath": "/kubernetes"}"#;
    let node: MenuNode = serde_json::from_str(json).expect("deserialize");

    assert_eq!(node.parent_path, "/kubernetes");
    assert!(node.permission.is_none());
    assert!(!node.is_root());
}

#[test]
fn test_route_node_builder() {
    let route = RouteNode::new("/task", "Task", "views/task/Index")
        .with_title("Tasks")
        .with_children(vec![RouteNode::new("execute", "TaskExecute", "views/task/Execute")]);

    assert_eq!(route.meta.title.as_deref(), Some("Tasks"));
    assert_eq!(route.children[0].component.specifier(), "views/task/Execute");
}

#[test]
fn test_plugin_error_display() {
    let not_found = PluginError::NotFound("my-plugin".to_string());
    let install = PluginError::InstallFailed("monitor".to_string(), "db down".to_string());
    let timeout = PluginError::HookTimeout("slow".to_string(), 30);
    let orphan = PluginError::OrphanMenu {
        path: "/a/x".to_string(),
        parent_path: "/a".to_string(),
    };

    assert!(not_found.to_string().contains("my-plugin"));
    assert!(install.to_string().contains("db down"));
    assert!(timeout.to_string().contains("30 seconds"));
    assert!(orphan.to_string().contains("/a/x"));
}

#[test]
fn test_core_error_conversion() {
    let core = opsdeck_core::Error::InvalidPayload("bad".to_string());
    let err: PluginError = core.into();
    assert!(matches!(err, PluginError::Core(_)));
    assert!(err.to_string().contains("bad"));
}
