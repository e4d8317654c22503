//! Host route table and menu payload source for the console shell

use std::path::PathBuf;

use async_trait::async_trait;
use opsdeck_core::permission::{AuthorizedMenu, MenuSource};
use opsdeck_plugins::{PluginResult, RouteNode, RouteTable};

/// Fixed routes of the console: login plus the layout hosting every page
pub fn shell_routes(host_route: &str) -> PluginResult<RouteTable> {
    RouteTable::new(
        host_route,
        vec![
            RouteNode::new("/login", "Login", "views/Login").with_title("Login"),
            RouteNode::new("/", host_route, "views/Layout")
                .with_redirect("/dashboard")
                .with_children(vec![
                    RouteNode::new("dashboard", "Dashboard", "views/Dashboard").with_title("Home"),
                    RouteNode::new("users", "Users", "views/system/Users").with_title("Users"),
                    RouteNode::new("roles", "Roles", "views/system/Roles").with_title("Roles"),
                    RouteNode::new("departments", "Departments", "views/system/Departments")
                        .with_title("Departments"),
                    RouteNode::new("menus", "Menus", "views/system/Menus").with_title("Menus"),
                    RouteNode::new("profile", "Profile", "views/Profile").with_title("Profile"),
                ]),
        ],
    )
}

/// Reads the authorized menu from a saved `/api/v1/menus/user` response
pub struct FileMenuSource {
    path: PathBuf,
}

impl FileMenuSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MenuSource for FileMenuSource {
    async fn authorized_menu(&self) -> opsdeck_core::Result<Vec<AuthorizedMenu>> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        AuthorizedMenu::parse_tree(&contents)
    }
}
