//! Kubernetes container management

use async_trait::async_trait;
use opsdeck_plugins::{MenuNode, Plugin, PluginResult, RouteNode};
use tracing::debug;

const ROOT: &str = "/kubernetes";

/// Cluster, node, workload and namespace management
pub struct KubernetesPlugin;

#[async_trait]
impl Plugin for KubernetesPlugin {
    fn name(&self) -> &str {
        "kubernetes"
    }

    fn description(&self) -> &str {
        "Kubernetes management: clusters, nodes, workloads, namespaces and more"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn author(&self) -> &str {
        "J"
    }

    async fn install(&self) -> PluginResult<()> {
        debug!(plugin = "kubernetes", "No install-time setup required");
        Ok(())
    }

    async fn uninstall(&self) -> PluginResult<()> {
        Ok(())
    }

    fn menus(&self) -> Option<Vec<MenuNode>> {
        let sections = [
            ("Clusters", "clusters", "OfficeBuilding"),
            ("Nodes", "nodes", "Monitor"),
            ("Namespaces", "namespaces", "FolderOpened"),
            ("Workloads", "workloads", "Tools"),
            ("Network", "network", "Connection"),
            ("Configuration", "config", "Document"),
            ("Storage", "storage", "Files"),
            ("Access Control", "access", "Lock"),
            ("Terminal Audit", "audit", "View"),
            ("Application Diagnosis", "application-diagnosis", "Cpu"),
            ("Cluster Inspection", "cluster-inspection", "DocumentChecked"),
        ];

        let mut menus = vec![MenuNode::root("Containers", ROOT, 100).with_icon("Platform")];
        menus.extend(sections.iter().zip(1..).map(|(&(name, slug, icon), sort)| {
            MenuNode::child(name, format!("{}/{}", ROOT, slug), ROOT, sort).with_icon(icon)
        }));
        Some(menus)
    }

    fn routes(&self) -> Option<Vec<RouteNode>> {
        Some(vec![
            RouteNode::new(ROOT, "Kubernetes", "views/kubernetes/Index")
                .with_title("Kubernetes")
                .with_children(vec![
                    RouteNode::new("clusters", "K8sClusters", "views/kubernetes/Clusters")
                        .with_title("Clusters"),
                    RouteNode::new("clusters/:id", "K8sClusterDetail", "views/kubernetes/ClusterDetail")
                        .with_title("Cluster Detail")
                        .with_active_menu("/kubernetes/clusters"),
                    RouteNode::new("nodes", "K8sNodes", "views/kubernetes/Nodes").with_title("Nodes"),
                    RouteNode::new(
                        "clusters/:clusterId/nodes/:nodeName",
                        "K8sNodeDetail",
                        "views/kubernetes/NodeDetail",
                    )
                    .with_title("Node Detail")
                    .with_active_menu("/kubernetes/nodes"),
                    RouteNode::new("workloads", "K8sWorkloads", "views/kubernetes/Workloads")
                        .with_title("Workloads"),
                    RouteNode::new("namespaces", "K8sNamespaces", "views/kubernetes/Namespaces")
                        .with_title("Namespaces"),
                    RouteNode::new("roles", "K8sRoles", "views/kubernetes/Roles").with_title("Roles"),
                    RouteNode::new("network", "K8sNetwork", "views/kubernetes/Network")
                        .with_title("Network"),
                    RouteNode::new("config", "K8sConfig", "views/kubernetes/Config")
                        .with_title("Configuration"),
                    RouteNode::new("storage", "K8sStorage", "views/kubernetes/Storage")
                        .with_title("Storage"),
                    RouteNode::new("access", "K8sAccess", "views/kubernetes/Access")
                        .with_title("Access Control"),
                    RouteNode::new("audit", "K8sAudit", "views/kubernetes/Audit")
                        .with_title("Terminal Audit"),
                    RouteNode::new(
                        "application-diagnosis",
                        "K8sApplicationDiagnosis",
                        "views/kubernetes/ApplicationDiagnosis",
                    )
                    .with_title("Application Diagnosis"),
                    RouteNode::new(
                        "cluster-inspection",
                        "K8sClusterInspection",
                        "views/kubernetes/ClusterInspection",
                    )
                    .with_title("Cluster Inspection"),
                ]),
        ])
    }
}
