//! dockview - terminal dashboard for local containers

use clap::Parser;
use dockview_config::{ConfigError, DashboardConfig};
use dockview_runtime::{create_runtime, ContainerRuntime};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "dockview")]
#[command(
    author,
    version,
    about = "Terminal dashboard for Docker/Podman containers, grouped by compose project",
    long_about = None
)]
struct Cli {
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Container runtime executable (docker or podman)
    #[arg(long)]
    runtime: Option<String>,

    /// Seconds between refreshes
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// Config file (default: ~/.config/dockview/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to this file while the dashboard runs
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write the default configuration to the config path and exit
    #[arg(long)]
    write_default_config: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => match DashboardConfig::config_path() {
            Ok(path) => Some(path),
            Err(ConfigError::NoConfigDir) => None,
            Err(e) => return Err(e.into()),
        },
    };

    if cli.write_default_config {
        let path = config_path.ok_or(ConfigError::NoConfigDir)?;
        return write_default_config(&path);
    }

    let mut config = match &config_path {
        Some(path) => DashboardConfig::load_from(path)?,
        None => DashboardConfig::default(),
    };

    // Command-line flags override the file
    if let Some(runtime) = cli.runtime {
        config.runtime.program = runtime;
    }
    if let Some(interval) = cli.interval {
        config.refresh.interval_secs = interval;
    }
    if cli.log_file.is_some() {
        config.log_file = cli.log_file;
    }
    config.validate()?;

    // Without a log file, logs are only shown until the dashboard takes over the terminal
    let startup_guard = init_logging(cli.verbose, config.log_file.as_deref())?;

    tracing::debug!("Config path: {:?}", config_path);
    let runtime = Arc::new(create_runtime(&config.runtime));
    if let Err(e) = runtime.ping().await {
        tracing::warn!("{} is not reachable yet: {}", config.runtime.program, e);
    }

    drop(startup_guard);
    dockview_tui::run(runtime, &config).await?;
    Ok(())
}

/// Install logging. Returns a guard when logs go to stderr; dropping it silences them.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> anyhow::Result<Option<DefaultGuard>> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", path.display(), e))?;

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
            Ok(None)
        }
        None => {
            let subscriber = tracing_subscriber::registry().with(filter).with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            );
            Ok(Some(tracing::subscriber::set_default(subscriber)))
        }
    }
}

fn write_default_config(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("Config file already exists at {}", path.display());
    }
    DashboardConfig::default().save_to(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
