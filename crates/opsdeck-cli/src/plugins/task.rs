use async_trait::async_trait;
use opsdeck_plugins::{MenuNode, Plugin, PluginResult, RouteNode};

/// Task center: ad-hoc execution, templates and file distribution
pub struct TaskPlugin;

#[async_trait]
impl Plugin for TaskPlugin {
    fn name(&self) -> &str {
        "task"
    }

    fn description(&self) -> &str {
        "Task center with job execution, template management and file distribution"
    }

    fn version(&self) -> &str {
        "1.0.0"
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
        Some(vec![
            MenuNode::root("Task Center", "/task", 90).with_icon("Tickets"),
            MenuNode::child("Execute", "/task/execute", "/task", 1).with_icon("VideoPlay"),
            MenuNode::child("Templates", "/task/templates", "/task", 2).with_icon("Document"),
            MenuNode::child("File Distribution", "/task/file-distribution", "/task", 3)
                .with_icon("FolderOpened"),
            MenuNode::child("Execution History", "/task/execution-history", "/task", 4)
                .with_icon("Notebook"),
        ])
    }

    fn routes(&self) -> Option<Vec<RouteNode>> {
        Some(vec![
            RouteNode::new("/task", "Task", "views/task/Index")
                .with_title("Task Center")
                .with_children(vec![
                    RouteNode::new("execute", "TaskExecute", "views/task/Execute").with_title("Execute"),
                    RouteNode::new("templates", "TaskTemplates", "views/task/Templates")
                        .with_title("Templates"),
                    RouteNode::new(
                        "file-distribution",
                        "TaskFileDistribution",
                        "views/task/FileDistribution",
                    )
                    .with_title("File Distribution"),
                    RouteNode::new(
                        "execution-history",
                        "TaskExecutionHistory",
                        "views/task/ExecutionHistory",
                    )
                    .with_title("Execution History"),
                ]),
        ])
    }
}
