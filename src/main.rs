//! launch-eliminator - Start launches so that a new launch replaces a running
//! one with the same configuration name

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use launch_eliminator::host::LocalHost;
use launch_eliminator::persistence::{Database, DatabaseSink};
use launch_eliminator::{
    DiagnosticSink, EliminatorPlugin, Settings, TracingSink, APP_NAME, APP_VERSION,
};

#[derive(Parser)]
#[command(name = "launch-eliminator", version, about)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Launch configurations by name, in order, and wait for them to exit
    Run {
        /// Configuration names
        #[arg(required = true)]
        names: Vec<String>,
        /// Delay between consecutive launches (ms)
        #[arg(long, default_value_t = 0)]
        stagger_ms: u64,
    },
    /// List the configured launches
    List,
    /// Show recent diagnostics
    Log {
        /// Number of entries
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings_path = cli.settings.clone().unwrap_or_else(Settings::default_path);
    let settings = Settings::load(&settings_path)?;

    // Initialize logging
    init_logging(settings.debug_logging);

    info!("{} v{} starting...", APP_NAME, APP_VERSION);

    match cli.command {
        Command::Run { names, stagger_ms } => run(&settings, &names, stagger_ms),
        Command::List => {
            list(&settings);
            Ok(())
        }
        Command::Log { limit } => show_log(&settings, limit),
    }
}

/// Initialize the logging system
fn init_logging(debug: bool) {
    let default_filter = if debug {
        "launch_eliminator=debug"
    } else {
        "launch_eliminator=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn open_database(settings: &Settings) -> Result<Arc<Database>> {
    let db = Database::open(&settings.get_database_path())?;
    db.initialize()?;
    Ok(Arc::new(db))
}

/// Diagnostics go to the database, or only to the log if it cannot be opened
fn diagnostics_sink(settings: &Settings) -> Arc<dyn DiagnosticSink> {
    match open_database(settings) {
        Ok(database) => {
            if settings.history_retention_days > 0 {
                match database.prune_diagnostics(settings.history_retention_days) {
                    Ok(0) => {}
                    Ok(n) => info!("Pruned {} old diagnostics", n),
                    Err(e) => warn!("Failed to prune diagnostics: {:#}", e),
                }
            }
            Arc::new(DatabaseSink::new(database, settings.plugin_id.clone()))
        }
        Err(e) => {
            warn!("Diagnostics database unavailable, logging only: {:#}", e);
            Arc::new(TracingSink)
        }
    }
}

fn run(settings: &Settings, names: &[String], stagger_ms: u64) -> Result<()> {
    // Resolve every name up front so a typo does not leave half the
    // launches running.
    let configs = names
        .iter()
        .map(|name| {
            settings
                .find_configuration(name)
                .cloned()
                .with_context(|| format!("Unknown launch configuration '{}'", name))
        })
        .collect::<Result<Vec<_>>>()?;

    let host = LocalHost::new(settings.poll_interval())?;
    let mut plugin = EliminatorPlugin::new(
        host.manager.clone(),
        host.events.clone(),
        host.launcher.clone(),
        diagnostics_sink(settings),
    );
    plugin.start();

    for (i, config) in configs.into_iter().enumerate() {
        if i > 0 && stagger_ms > 0 {
            std::thread::sleep(Duration::from_millis(stagger_ms));
        }
        let name = config.name.clone();
        if let Err(e) = host.launcher.launch(config) {
            error!("Failed to launch '{}': {:#}", name, e);
        }
    }

    host.launcher.wait_all(settings.poll_interval());
    let finished = host.manager.remove_terminated();
    info!("All launches terminated ({} finished)", finished);

    plugin.stop();
    host.shutdown();
    Ok(())
}

fn list(settings: &Settings) {
    if settings.launch_configurations.is_empty() {
        println!("No launch configurations defined");
        return;
    }
    for config in &settings.launch_configurations {
        let marker = if Settings::is_managed(config) { "*" } else { " " };
        println!(
            "{} {:<24} {}",
            marker,
            config.name,
            config.executable_path.display()
        );
    }
}

fn show_log(settings: &Settings, limit: usize) -> Result<()> {
    let database = open_database(settings)?;
    for entry in database.recent_diagnostics(limit)? {
        println!(
            "{} {:<7} {} {}",
            entry.logged_at.format("%Y-%m-%d %H:%M:%S"),
            entry.severity.label(),
            entry.plugin_id,
            entry.message
        );
    }
    Ok(())
}
