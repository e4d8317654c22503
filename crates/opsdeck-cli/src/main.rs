//! OpsDeck CLI - plugin-based operations console shell

mod plugins;
mod shell;

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use opsdeck_core::Error;
use opsdeck_core::config::Config;
use opsdeck_core::permission::{MenuKind, MenuSource, PermissionDirective, PermissionStore};
use opsdeck_plugins::{Console, MenuItem, Navigation, PluginError, PluginInfo, PluginState};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::shell::{FileMenuSource, shell_routes};

#[derive(Parser)]
#[command(name = "opsdeck")]
#[command(author, version, about = "Plugin-based operations console shell", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Debug logging for opsdeck crates
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration directory (defaults to $OPSDECK_CONFIG_DIR or the user config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered plugins and their lifecycle state
    Plugins,

    /// Show the composed route table
    Routes,

    /// Show the menu a user sees after login
    Menu {
        /// Saved authorized-menu response (JSON)
        #[arg(short, long)]
        payload: PathBuf,
        /// Log in as administrator
        #[arg(long)]
        admin: bool,
    },

    /// Check whether a permission code is granted
    Check {
        /// Permission code, e.g. user:delete
        code: String,
        /// Saved authorized-menu response; without it nothing is loaded
        #[arg(short, long)]
        payload: Option<PathBuf>,
        /// Log in as administrator
        #[arg(long)]
        admin: bool,
    },

    /// Resolve a URL path against the composed route table
    Resolve {
        path: String,
        /// Navigate without a session
        #[arg(long)]
        anonymous: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let result = run(cli).await;
    if let Some(hint) = result.as_ref().err().and_then(suggestion) {
        eprintln!("hint: {}", hint);
    }
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => Config::config_dir()?,
    };
    let config = match (&cli.command, Config::load_from(&config_dir)) {
        (_, Ok(config)) => config,
        // `config reset` must still work on a broken file
        (Commands::Config { .. }, Err(e)) => {
            eprintln!("warning: {:#}", e);
            Config::default()
        }
        (_, Err(e)) => return Err(e),
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(&config, cli.verbose)?)
        .init();
    debug!(config_dir = %config_dir.display(), "Configuration loaded");

    match cli.command {
        Commands::Plugins => cmd_plugins(&config, cli.format).await,
        Commands::Routes => cmd_routes(&config, cli.format).await,
        Commands::Menu { payload, admin } => cmd_menu(&config, &payload, admin, cli.format).await,
        Commands::Check {
            code,
            payload,
            admin,
        } => cmd_check(&config, &code, payload.as_deref(), admin, cli.format).await,
        Commands::Resolve { path, anonymous } => {
            cmd_resolve(&config, &path, anonymous, cli.format).await
        }
        Commands::Config { action } => cmd_config(&config_dir, action),
    }
}

/// Recovery hint from the first core error in the cause chain
fn suggestion(err: &anyhow::Error) -> Option<String> {
    err.chain()
        .find_map(|cause| match cause.downcast_ref::<PluginError>() {
            Some(PluginError::Core(inner)) => Some(inner),
            _ => cause.downcast_ref::<Error>(),
        })
        .and_then(Error::suggestion)
}

/// `RUST_LOG` wins; otherwise the configured filter, raised to debug by `--verbose`
fn log_filter(config: &Config, verbose: bool) -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let mut filter = EnvFilter::try_new(&config.logging.filter).map_err(|e| {
        Error::ConfigError(format!("invalid logging.filter '{}': {}", config.logging.filter, e))
    })?;
    if verbose {
        filter = filter.add_directive("opsdeck=debug".parse()?);
    }
    Ok(filter)
}

/// Console with the built-in plugins installed and their routes grafted
async fn started_console(config: &Config) -> anyhow::Result<Console> {
    let routes = shell_routes(&config.routes.host_route)?;
    let mut console = Console::new(config, routes);
    for plugin in plugins::builtin() {
        console.register(plugin)?;
    }

    let report = console.start().await?;
    for (name, error) in &report.lifecycle.failed {
        eprintln!("warning: plugin '{}' failed to install: {}", name, error);
    }
    for (name, error) in &report.routes_rejected {
        eprintln!("warning: routes of plugin '{}' were not registered: {}", name, error);
    }
    Ok(console)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct PluginRow {
    #[serde(flatten)]
    info: PluginInfo,
    state: PluginState,
}

async fn cmd_plugins(config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let mut console = started_console(config).await?;
    let rows: Vec<PluginRow> = console
        .plugin_infos()
        .into_iter()
        .map(|info| PluginRow {
            state: console.plugin_state(&info.name),
            info,
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Text => {
            println!("{:<12} {:<8} {:<12} DESCRIPTION", "NAME", "VERSION", "STATE");
            for row in &rows {
                println!(
                    "{:<12} {:<8} {:<12} {}",
                    row.info.name, row.info.version, row.state, row.info.description
                );
            }
        }
    }

    console.shutdown().await;
    Ok(())
}

async fn cmd_routes(config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let mut console = started_console(config).await?;

    match format {
        OutputFormat::Json => print_json(&console.routes().routes())?,
        OutputFormat::Text => {
            for (path, route) in console.routes().flatten() {
                let mut line = format!("{:<48} {:<26} {}", path, route.name, route.component.specifier());
                if let Some(redirect) = &route.redirect {
                    line.push_str(&format!(" -> {}", redirect));
                }
                println!("{}", line.trim_end());
            }
        }
    }

    console.shutdown().await;
    Ok(())
}

fn print_menu(items: &[MenuItem], depth: usize) {
    for item in items {
        println!("{}{} ({})", "  ".repeat(depth), item.node.name, item.node.path);
        print_menu(&item.children, depth + 1);
    }
}

async fn cmd_menu(
    config: &Config,
    payload: &Path,
    admin: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut console = started_console(config).await?;
    console
        .login(&FileMenuSource::new(payload), admin)
        .await
        .with_context(|| format!("Failed to compose menu from {}", payload.display()))?;
    for (name, error) in console.rejected_menus() {
        eprintln!("warning: menus of plugin '{}' were left out: {}", name, error);
    }

    let visible = console.visible_menu();
    info!(roots = visible.len(), "Menu rendered");
    match format {
        OutputFormat::Json => print_json(&visible)?,
        OutputFormat::Text => print_menu(&visible, 0),
    }

    console.shutdown().await;
    Ok(())
}

#[derive(Serialize)]
struct CheckResult<'a> {
    code: &'a str,
    allowed: bool,
    loaded: bool,
    admin: bool,
}

async fn cmd_check(
    config: &Config,
    code: &str,
    payload: Option<&Path>,
    admin: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if code.trim().is_empty() {
        return Err(Error::InvalidInput("permission code cannot be empty".to_string()).into());
    }

    let mut store = PermissionStore::with_action_kind(MenuKind(config.permissions.action_kind));
    if let Some(path) = payload {
        let source = FileMenuSource::new(path);
        let tree = source
            .authorized_menu()
            .await
            .with_context(|| format!("Failed to read payload {}", path.display()))?;
        store.load(&tree, admin);
    } else if admin {
        store.load(&[], true);
    }

    let attachment = PermissionDirective::attach(&store, Some(code));
    let result = CheckResult {
        code,
        allowed: attachment.is_visible(),
        loaded: store.is_loaded(),
        admin: store.is_admin(),
    };

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Text => {
            let verdict = if result.allowed { "allowed" } else { "denied" };
            if result.loaded {
                println!("{}: {}", code, verdict);
            } else {
                println!("{}: {} (no permissions loaded)", code, verdict);
            }
        }
    }
    Ok(())
}

async fn cmd_resolve(
    config: &Config,
    path: &str,
    anonymous: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut console = started_console(config).await?;

    let target = match console.navigate(path, !anonymous) {
        Navigation::Proceed => path.to_string(),
        Navigation::Redirect(to) => {
            if format == OutputFormat::Text {
                println!("redirect: {} -> {}", path, to);
            }
            to
        }
    };

    let matched = console
        .resolve(&target)
        .ok_or_else(|| anyhow!("No route matches {}", target))?;

    match format {
        OutputFormat::Json => print_json(&matched)?,
        OutputFormat::Text => {
            println!("route:       {}", matched.name);
            println!("pattern:     {}", matched.pattern);
            println!("component:   {}", matched.component.specifier());
            println!("chain:       {}", matched.chain.join(" > "));
            for (name, value) in &matched.params {
                println!("param:       {} = {}", name, value);
            }
            println!("active menu: {}", matched.active_menu);
        }
    }

    console.shutdown().await;
    Ok(())
}

fn cmd_config(dir: &Path, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load_from(dir)?;
            println!("{}", config.get(&key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(dir)?;
            config.set(&key, &value)?;
            config.save_to(dir)?;
            println!("Set {} = {}", key, value);
        }
        ConfigAction::List => {
            let config = Config::load_from(dir)?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset_in(dir)?;
            println!("Configuration reset to defaults.");
        }
        ConfigAction::Path => {
            println!("{}", dir.join("config.toml").display());
        }
    }
    Ok(())
}
