//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// OpsDeck console configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub plugins: PluginsConfig,
    pub routes: RoutesConfig,
    pub permissions: PermissionsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    /// Upper bound for a single install/uninstall hook
    pub install_timeout_secs: u64,
    /// Plugins that stay registered but are never installed
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Name of the host route plugin routes are grafted under
    pub host_route: String,
    pub login_path: String,
    pub home_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionsConfig {
    /// Menu `type` value marking button/action nodes
    pub action_kind: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            install_timeout_secs: 30,
            disabled: Vec::new(),
        }
    }
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            host_route: "Layout".to_string(),
            login_path: "/login".to_string(),
            home_path: "/dashboard".to_string(),
        }
    }
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self { action_kind: 3 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "opsdeck=info".to_string(),
        }
    }
}

impl PluginsConfig {
    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_secs)
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|d| d == name)
    }
}

const CONFIG_FILE: &str = "config.toml";

const KEYS: &[&str] = &[
    "plugins.install_timeout_secs",
    "plugins.disabled",
    "routes.host_route",
    "routes.login_path",
    "routes.home_path",
    "permissions.action_kind",
    "logging.filter",
];

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("OPSDECK_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("opsdeck")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load configuration from file, or fall back to defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_dir()?)
    }

    /// Load `config.toml` from an explicit directory
    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let path = dir.join(CONFIG_FILE);

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config = Self::from_toml(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_dir()?)
    }

    pub fn save_to(&self, dir: &Path) -> anyhow::Result<()> {
        self.validate()?;

        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = dir.join(CONFIG_FILE);
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.plugins.install_timeout_secs == 0 {
            return Err(anyhow!("plugins.install_timeout_secs must be greater than zero"));
        }
        if self.routes.host_route.trim().is_empty() {
            return Err(anyhow!("routes.host_route cannot be empty"));
        }
        for (key, path) in [
            ("routes.login_path", &self.routes.login_path),
            ("routes.home_path", &self.routes.home_path),
        ] {
            if !path.starts_with('/') {
                return Err(anyhow!("{} must be an absolute path, got '{}'", key, path));
            }
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "plugins.install_timeout_secs" => Ok(self.plugins.install_timeout_secs.to_string()),
            "plugins.disabled" => Ok(self.plugins.disabled.join(", ")),
            "routes.host_route" => Ok(self.routes.host_route.clone()),
            "routes.login_path" => Ok(self.routes.login_path.clone()),
            "routes.home_path" => Ok(self.routes.home_path.clone()),
            "permissions.action_kind" => Ok(self.permissions.action_kind.to_string()),
            "logging.filter" => Ok(self.logging.filter.clone()),
            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `opsdeck config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "plugins.install_timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid install_timeout_secs value: {}", value))?;
                if secs == 0 {
                    return Err(anyhow!("Install timeout must be greater than zero"));
                }
                self.plugins.install_timeout_secs = secs;
            }
            "plugins.disabled" => {
                self.plugins.disabled = value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            "routes.host_route" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("Host route name cannot be empty"));
                }
                self.routes.host_route = value.to_string();
            }
            "routes.login_path" | "routes.home_path" => {
                if !value.starts_with('/') {
                    return Err(anyhow!("{} must be an absolute path", key));
                }
                if key == "routes.login_path" {
                    self.routes.login_path = value.to_string();
                } else {
                    self.routes.home_path = value.to_string();
                }
            }
            "permissions.action_kind" => {
                self.permissions.action_kind = value
                    .parse()
                    .with_context(|| format!("Invalid action_kind value: {}", value))?;
            }
            "logging.filter" => {
                self.logging.filter = value.to_string();
            }
            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `opsdeck config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        KEYS.iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        Self::reset_in(&Self::config_dir()?)
    }

    pub fn reset_in(dir: &Path) -> anyhow::Result<()> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
