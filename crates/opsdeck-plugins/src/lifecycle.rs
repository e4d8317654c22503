//! Plugin lifecycle controller
//!
//! Installs plugins one at a time in registry order; a plugin's install hook
//! only starts once every earlier hook has resolved. A failing or hanging
//! hook marks that plugin failed and startup moves on to the next one.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use opsdeck_core::config::PluginsConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::registry::PluginManager;
use crate::{PluginError, PluginResult};

/// Lifecycle state of a registered plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginState {
    Registered,
    Installed,
    Failed,
    Disabled,
    Uninstalled,
}

impl std::fmt::Display for PluginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Registered => "registered",
            Self::Installed => "installed",
            Self::Failed => "failed",
            Self::Disabled => "disabled",
            Self::Uninstalled => "uninstalled",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy)]
enum Hook {
    Install,
    Uninstall,
}

#[derive(Debug, Clone)]
struct Entry {
    state: PluginState,
    installed_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Outcome of a bulk install or uninstall pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleReport {
    pub installed: Vec<String>,
    pub uninstalled: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl LifecycleReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
pub struct LifecycleController {
    hook_timeout: Duration,
    disabled: HashSet<String>,
    entries: HashMap<String, Entry>,
    started: bool,
}

impl LifecycleController {
    pub fn new(hook_timeout: Duration) -> Self {
        Self {
            hook_timeout,
            disabled: HashSet::new(),
            entries: HashMap::new(),
            started: false,
        }
    }

    pub fn from_config(config: &PluginsConfig) -> Self {
        Self::new(config.install_timeout()).with_disabled(config.disabled.iter().cloned())
    }

    /// Plugins that stay registered but are skipped by `install_all`
    pub fn with_disabled(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.disabled.extend(names);
        self
    }

    /// Install every registered plugin, sequentially, in registry order
    pub async fn install_all(&mut self, registry: &PluginManager) -> LifecycleReport {
        let mut report = LifecycleReport::default();
        info!(count = registry.len(), "Installing plugins");

        for plugin in registry.iter() {
            let name = plugin.name().to_string();

            if self.disabled.contains(&name) {
                debug!(plugin = %name, "Plugin disabled by configuration, skipping");
                self.entry_mut(&name).state = PluginState::Disabled;
                report.skipped.push(name);
                continue;
            }
            if self.state(&name) == PluginState::Installed {
                debug!(plugin = %name, "Plugin already installed, skipping");
                report.skipped.push(name);
                continue;
            }

            match self.run_hook(&name, Hook::Install, plugin.install()).await {
                Ok(()) => report.installed.push(name),
                Err(e) => {
                    warn!(plugin = %name, error = %e, "Plugin install failed, continuing startup");
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        self.started = true;
        info!(
            installed = report.installed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Plugin installation finished"
        );
        report
    }

    /// Install (enable) a single plugin, overriding a configured disable
    pub async fn install(&mut self, registry: &PluginManager, name: &str) -> PluginResult<()> {
        let plugin = registry
            .get(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;

        self.disabled.remove(name);
        if self.state(name) == PluginState::Installed {
            debug!(plugin = %name, "Plugin already installed");
            return Ok(());
        }

        self.run_hook(name, Hook::Install, plugin.install()).await
    }

    /// Uninstall (disable) a single plugin
    pub async fn uninstall(&mut self, registry: &PluginManager, name: &str) -> PluginResult<()> {
        let plugin = registry
            .get(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;

        if self.state(name) != PluginState::Installed {
            return Err(PluginError::InvalidState(format!(
                "plugin '{}' is {}, not installed",
                name,
                self.state(name)
            )));
        }

        self.run_hook(name, Hook::Uninstall, plugin.uninstall()).await
    }

    /// Uninstall every installed plugin in reverse registry order
    pub async fn uninstall_all(&mut self, registry: &PluginManager) -> LifecycleReport {
        let mut report = LifecycleReport::default();

        for plugin in registry.iter().rev() {
            let name = plugin.name().to_string();
            if self.state(&name) != PluginState::Installed {
                report.skipped.push(name);
                continue;
            }

            match self.run_hook(&name, Hook::Uninstall, plugin.uninstall()).await {
                Ok(()) => report.uninstalled.push(name),
                Err(e) => {
                    warn!(plugin = %name, error = %e, "Plugin uninstall failed, continuing");
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        info!(
            uninstalled = report.uninstalled.len(),
            failed = report.failed.len(),
            "Plugin teardown finished"
        );
        report
    }

    async fn run_hook<F>(&mut self, name: &str, hook: Hook, fut: F) -> PluginResult<()>
    where
        F: Future<Output = PluginResult<()>>,
    {
        debug!(plugin = %name, hook = ?hook, "Running plugin hook");
        let result = match tokio::time::timeout(self.hook_timeout, fut).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(match hook {
                Hook::Install => PluginError::InstallFailed(name.to_string(), e.to_string()),
                Hook::Uninstall => PluginError::UninstallFailed(name.to_string(), e.to_string()),
            }),
            Err(_) => Err(PluginError::HookTimeout(
                name.to_string(),
                self.hook_timeout.as_secs(),
            )),
        };

        let entry = self.entry_mut(name);
        match (&result, hook) {
            (Ok(()), Hook::Install) => {
                entry.state = PluginState::Installed;
                entry.installed_at = Some(Utc::now());
                entry.last_error = None;
                info!(plugin = %name, "Plugin installed");
            }
            (Ok(()), Hook::Uninstall) => {
                entry.state = PluginState::Uninstalled;
                entry.installed_at = None;
                entry.last_error = None;
                info!(plugin = %name, "Plugin uninstalled");
            }
            (Err(e), Hook::Install) => {
                entry.state = PluginState::Failed;
                entry.last_error = Some(e.to_string());
            }
            // Teardown did not finish, so the plugin is still installed
            (Err(e), Hook::Uninstall) => {
                entry.last_error = Some(e.to_string());
            }
        }
        result
    }

    fn entry_mut(&mut self, name: &str) -> &mut Entry {
        self.entries.entry(name.to_string()).or_insert_with(|| Entry {
            state: PluginState::Registered,
            installed_at: None,
            last_error: None,
        })
    }

    pub fn state(&self, name: &str) -> PluginState {
        self.entries
            .get(name)
            .map(|e| e.state)
            .unwrap_or(PluginState::Registered)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.state(name) == PluginState::Installed
    }

    pub fn installed_at(&self, name: &str) -> Option<DateTime<Utc>> {
        self.entries.get(name).and_then(|e| e.installed_at)
    }

    pub fn last_error(&self, name: &str) -> Option<&str> {
        self.entries.get(name).and_then(|e| e.last_error.as_deref())
    }

    /// Whether `install_all` has completed at least once
    pub fn has_started(&self) -> bool {
        self.started
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Plugin;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum Behaviour {
        Succeed,
        Fail,
        Hang,
        FailUninstall,
    }

    struct Stub {
        name: &'static str,
        behaviour: Behaviour,
        installs: AtomicUsize,
        journal: Arc<Mutex<Vec<String>>>,
    }

    impl Stub {
        fn new(name: &'static str, behaviour: Behaviour, journal: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                behaviour,
                installs: AtomicUsize::new(0),
                journal: Arc::clone(journal),
            })
        }
    }

    #[async_trait]
    impl Plugin for Stub {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "lifecycle stub"
        }
        fn version(&self) -> &str {
            "0.0.1"
        }
        fn author(&self) -> &str {
            "tests"
        }

        async fn install(&self) -> PluginResult<()> {
            self.installs.fetch_add(1, Ordering::SeqCst);
            self.journal.lock().unwrap().push(format!("install:{}", self.name));
            match self.behaviour {
                Behaviour::Succeed | Behaviour::FailUninstall => Ok(()),
                Behaviour::Fail => Err(PluginError::InvalidState("boom".to_string())),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
            }
        }

        async fn uninstall(&self) -> PluginResult<()> {
            self.journal.lock().unwrap().push(format!("uninstall:{}", self.name));
            match self.behaviour {
                Behaviour::FailUninstall => Err(PluginError::InvalidState("stuck".to_string())),
                _ => Ok(()),
            }
        }
    }

    fn journal() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[tokio::test]
    async fn test_install_all_runs_in_registry_order() {
        let log = journal();
        let mut registry = PluginManager::new();
        registry.register(Stub::new("a", Behaviour::Succeed, &log));
        registry.register(Stub::new("b", Behaviour::Succeed, &log));
        registry.register(Stub::new("c", Behaviour::Succeed, &log));

        let mut lifecycle = LifecycleController::new(Duration::from_secs(5));
        assert!(!lifecycle.has_started());
        let report = lifecycle.install_all(&registry).await;

        assert_eq!(report.installed, vec!["a", "b", "c"]);
        assert!(report.is_clean());
        assert!(lifecycle.has_started());
        assert_eq!(*log.lock().unwrap(), vec!["install:a", "install:b", "install:c"]);
        assert!(lifecycle.installed_at("b").is_some());
    }

    #[tokio::test]
    async fn test_failed_install_is_isolated() {
        let log = journal();
        let mut registry = PluginManager::new();
        registry.register(Stub::new("a", Behaviour::Fail, &log));
        registry.register(Stub::new("b", Behaviour::Succeed, &log));

        let mut lifecycle = LifecycleController::new(Duration::from_secs(5));
        let report = lifecycle.install_all(&registry).await;

        assert_eq!(report.installed, vec!["b"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "a");
        assert_eq!(lifecycle.state("a"), PluginState::Failed);
        assert!(lifecycle.last_error("a").unwrap().contains("boom"));
        assert!(lifecycle.is_enabled("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_install_times_out() {
        let log = journal();
        let mut registry = PluginManager::new();
        registry.register(Stub::new("slow", Behaviour::Hang, &log));
        registry.register(Stub::new("fast", Behaviour::Succeed, &log));

        let mut lifecycle = LifecycleController::new(Duration::from_secs(2));
        let report = lifecycle.install_all(&registry).await;

        assert_eq!(report.installed, vec!["fast"]);
        assert!(report.failed[0].1.contains("timed out"));
        assert_eq!(lifecycle.state("slow"), PluginState::Failed);
    }

    #[tokio::test]
    async fn test_install_all_twice_is_idempotent() {
        let log = journal();
        let stub = Stub::new("a", Behaviour::Succeed, &log);
        let mut registry = PluginManager::new();
        registry.register(stub.clone());

        let mut lifecycle = LifecycleController::new(Duration::from_secs(5));
        lifecycle.install_all(&registry).await;
        let second = lifecycle.install_all(&registry).await;

        assert!(second.installed.is_empty());
        assert_eq!(second.skipped, vec!["a"]);
        assert_eq!(stub.installs.load(Ordering::SeqCst), 1);
        assert!(lifecycle.is_enabled("a"));
    }

    #[tokio::test]
    async fn test_disabled_plugins_are_skipped_until_enabled() {
        let log = journal();
        let mut registry = PluginManager::new();
        registry.register(Stub::new("a", Behaviour::Succeed, &log));
        registry.register(Stub::new("b", Behaviour::Succeed, &log));

        let mut lifecycle =
            LifecycleController::new(Duration::from_secs(5)).with_disabled(vec!["b".to_string()]);
        let report = lifecycle.install_all(&registry).await;

        assert_eq!(report.installed, vec!["a"]);
        assert_eq!(report.skipped, vec!["b"]);
        assert_eq!(lifecycle.state("b"), PluginState::Disabled);

        lifecycle.install(&registry, "b").await.expect("explicit enable");
        assert!(lifecycle.is_enabled("b"));
    }

    #[tokio::test]
    async fn test_single_install_and_uninstall() {
        let log = journal();
        let mut registry = PluginManager::new();
        registry.register(Stub::new("a", Behaviour::Succeed, &log));

        let mut lifecycle = LifecycleController::new(Duration::from_secs(5));
        assert!(matches!(
            lifecycle.uninstall(&registry, "a").await,
            Err(PluginError::InvalidState(_))
        ));
        assert!(matches!(
            lifecycle.install(&registry, "missing").await,
            Err(PluginError::NotFound(_))
        ));

        lifecycle.install(&registry, "a").await.expect("install");
        lifecycle.uninstall(&registry, "a").await.expect("uninstall");
        assert_eq!(lifecycle.state("a"), PluginState::Uninstalled);
        assert!(lifecycle.installed_at("a").is_none());
    }

    #[tokio::test]
    async fn test_explicit_install_surfaces_failure() {
        let log = journal();
        let mut registry = PluginManager::new();
        registry.register(Stub::new("a", Behaviour::Fail, &log));

        let mut lifecycle = LifecycleController::new(Duration::from_secs(5));
        let err = lifecycle.install(&registry, "a").await.unwrap_err();
        assert!(matches!(err, PluginError::InstallFailed(ref name, _) if name == "a"));
    }

    #[tokio::test]
    async fn test_uninstall_all_reverse_order() {
        let log = journal();
        let mut registry = PluginManager::new();
        registry.register(Stub::new("a", Behaviour::Succeed, &log));
        registry.register(Stub::new("b", Behaviour::Fail, &log));
        registry.register(Stub::new("c", Behaviour::Succeed, &log));

        let mut lifecycle = LifecycleController::new(Duration::from_secs(5));
        lifecycle.install_all(&registry).await;
        log.lock().unwrap().clear();

        let report = lifecycle.uninstall_all(&registry).await;
        assert_eq!(report.uninstalled, vec!["c", "a"]);
        assert_eq!(report.skipped, vec!["b"]);
        assert_eq!(*log.lock().unwrap(), vec!["uninstall:c", "uninstall:a"]);
    }

    #[tokio::test]
    async fn test_failed_uninstall_keeps_plugin_installed() {
        let log = journal();
        let mut registry = PluginManager::new();
        registry.register(Stub::new("a", Behaviour::FailUninstall, &log));

        let mut lifecycle = LifecycleController::new(Duration::from_secs(5));
        lifecycle.install_all(&registry).await;

        let err = lifecycle.uninstall(&registry, "a").await.unwrap_err();
        assert!(matches!(err, PluginError::UninstallFailed(ref name, _) if name == "a"));
        assert_eq!(lifecycle.state("a"), PluginState::Installed);
        assert!(lifecycle.is_enabled("a"));
        assert!(lifecycle.installed_at("a").is_some());
        assert!(lifecycle.last_error("a").unwrap().contains("stuck"));

        let report = lifecycle.uninstall_all(&registry).await;
        assert_eq!(report.failed.len(), 1);
        assert!(lifecycle.is_enabled("a"));
    }
}
