use async_trait::async_trait;
use opsdeck_plugins::{MenuNode, Plugin, PluginResult, RouteNode};

/// Monitoring center: domain checks and alerting
pub struct MonitorPlugin;

#[async_trait]
impl Plugin for MonitorPlugin {
    fn name(&self) -> &str {
        "monitor"
    }

    fn description(&self) -> &str {
        "Monitoring center with domain monitoring and alert management"
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
            MenuNode::root("Monitoring", "/monitor", 20).with_icon("Monitor"),
            MenuNode::child("Domains", "/monitor/domain", "/monitor", 1).with_icon("Monitor"),
            MenuNode::child("Alert Channels", "/monitor/alert-channels", "/monitor", 2)
                .with_icon("Bell"),
            MenuNode::child("Alert Receivers", "/monitor/alert-receivers", "/monitor", 3)
                .with_icon("User"),
            MenuNode::child("Alert Logs", "/monitor/alert-logs", "/monitor", 4).with_icon("Document"),
        ])
    }

    // Flat absolute routes, all grafted directly under the host route
    fn routes(&self) -> Option<Vec<RouteNode>> {
        Some(vec![
            RouteNode::new("/monitor", "Monitor", "plugins/monitor/DomainMonitor")
                .with_redirect("/monitor/domain")
                .with_title("Monitoring"),
            RouteNode::new("/monitor/domain", "DomainMonitor", "plugins/monitor/DomainMonitor")
                .with_title("Domains"),
            RouteNode::new(
                "/monitor/alert-channels",
                "AlertChannels",
                "plugins/monitor/AlertChannels",
            )
            .with_title("Alert Channels"),
            RouteNode::new(
                "/monitor/alert-receivers",
                "AlertReceivers",
                "plugins/monitor/AlertReceivers",
            )
            .with_title("Alert Receivers"),
            RouteNode::new("/monitor/alert-logs", "AlertLogs", "plugins/monitor/AlertLogs")
                .with_title("Alert Logs"),
        ])
    }
}
