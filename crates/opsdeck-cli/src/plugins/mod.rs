//! Built-in feature plugins shipped with the console

mod kubernetes;
mod monitor;
mod task;

use std::sync::Arc;

use opsdeck_plugins::Plugin;

pub use kubernetes::KubernetesPlugin;
pub use monitor::MonitorPlugin;
pub use task::TaskPlugin;

/// Every built-in plugin, in registration order
pub fn builtin() -> Vec<Arc<dyn Plugin>> {
    vec![
        Arc::new(KubernetesPlugin),
        Arc::new(TaskPlugin),
        Arc::new(MonitorPlugin),
    ]
}
