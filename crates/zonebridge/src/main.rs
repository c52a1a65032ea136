//! Zonebridge
//!
//! Keeps a hosting control plane and an external DNS server in agreement
//! about zone contents: pushes authored zones to the remote zone API and
//! listens for DNS NOTIFY messages to pull changes back in.

use anyhow::{bail, Context, Result};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;
use zonebridge_api::DnsApiClient;
use zonebridge_config::{Config, ConfigHolder};
use zonebridge_model::{NotifyEvent, ResourceRecord};
use zonebridge_notify::{CommandDispatcher, NotifyDispatch, NotifyHandler, NotifyServer, ZoneAllowList};
use zonebridge_sync::SyncEngine;

/// Zonebridge - bidirectional DNS control-plane synchronization
#[derive(Parser, Debug)]
#[command(name = "zonebridge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the NOTIFY listener
    Listen,

    /// Reconcile one zone's records against the remote server
    Sync {
        /// Zone name (e.g. example.com)
        zone: String,

        /// JSON file with the zone's parsed records
        #[arg(short, long, value_name = "FILE")]
        records: PathBuf,
    },

    /// Export a remote zone as zone-file text
    Export {
        /// Zone name
        zone: String,

        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Delete a zone from the remote server
    Remove {
        /// Zone name
        zone: String,
    },

    /// Validate the configuration file
    Validate {
        /// Show the parsed configuration
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Finds the configuration file in standard locations.
fn find_config_file(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path);
    }

    let search_paths = [
        PathBuf::from("./zonebridge.conf"),
        PathBuf::from("/etc/zonebridge/zonebridge.conf"),
        PathBuf::from("/etc/zonebridge.conf"),
    ];

    search_paths.into_iter().find(|p| p.exists())
}

fn parse_log_level(level: &str) -> Level {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn init_logging(config: &Config, cli_level: Option<&str>, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::ERROR
    } else if let Some(level) = cli_level {
        parse_log_level(level)
    } else {
        parse_log_level(&config.logging.level)
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>, quiet: bool) -> Result<(Config, Option<PathBuf>)> {
    match find_config_file(path) {
        Some(path) => {
            let config = Config::from_file(&path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            config.validate().context("invalid configuration")?;
            Ok((config, Some(path)))
        }
        None => {
            if !quiet {
                eprintln!("No configuration file found, using defaults");
            }
            Ok((Config::default(), None))
        }
    }
}

fn build_engine(config: &Config) -> Result<SyncEngine> {
    if config.api.url.is_empty() {
        bail!("api_url is not configured");
    }
    if config.api.key.is_empty() {
        bail!("api_key is not configured");
    }

    let client = DnsApiClient::builder(&config.api.url, config.api.key.clone())
        .server_id(config.api.server_id.clone())
        .timeout(Duration::from_secs(config.api.timeout_secs))
        .build()
        .context("failed to build API client")?;

    Ok(SyncEngine::new(client, config.policy.clone()))
}

/// Fallback dispatcher when no resync command is configured: the NOTIFY
/// is acknowledged and logged, nothing else happens.
struct LogOnlyDispatcher;

#[async_trait]
impl NotifyDispatch for LogOnlyDispatcher {
    async fn dispatch(&self, event: &NotifyEvent) -> zonebridge_notify::Result<()> {
        warn!(zone = %event.zone, "No resync_command configured; NOTIFY acknowledged only");
        Ok(())
    }
}

fn build_dispatcher(config: &Config) -> Arc<dyn NotifyDispatch> {
    match CommandDispatcher::new(&config.dispatch.resync_command) {
        Some(dispatcher) => Arc::new(dispatcher),
        None => Arc::new(LogOnlyDispatcher),
    }
}

fn write_pid_file(path: &PathBuf) -> Result<()> {
    std::fs::write(path, format!("{}\n", std::process::id()))
        .with_context(|| format!("failed to write PID file {}", path.display()))
}

async fn run_listener(config: Config, config_path: Option<PathBuf>) -> Result<()> {
    let holder = Arc::new(match &config_path {
        Some(path) => ConfigHolder::from_file(path)?,
        None => ConfigHolder::new(config.clone()),
    });

    let allow = Arc::new(ArcSwap::new(Arc::new(ZoneAllowList::from_entries(
        config.allowed_zones.iter(),
    ))));
    let dispatcher = build_dispatcher(&config);

    let handler = Arc::new(NotifyHandler::new(
        allow.clone(),
        dispatcher,
        config.dispatch.max_dispatch,
    ));

    let bind_addr = std::net::SocketAddr::new(config.listener.address, config.listener.port);
    let server = NotifyServer::bind(bind_addr, handler)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    if let Some(pid_file) = &config.listener.pid_file {
        write_pid_file(pid_file)?;
    }

    // Termination signals stop both accept loops.
    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to register SIGTERM handler");
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
            .expect("failed to register SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("Received SIGINT, shutting down"),
        }

        let _ = shutdown.send(());
    });

    // SIGHUP re-reads the configuration and swaps the allow-list without
    // touching the open sockets. Bind changes need a restart.
    {
        let holder = holder.clone();
        let allow = allow.clone();
        tokio::spawn(async move {
            let mut sighup = signal::unix::signal(signal::unix::SignalKind::hangup())
                .expect("failed to register SIGHUP handler");

            loop {
                sighup.recv().await;
                match holder.reload() {
                    Ok(()) => {
                        let reloaded = holder.get();
                        allow.store(Arc::new(ZoneAllowList::from_entries(
                            reloaded.allowed_zones.iter(),
                        )));
                        info!(
                            allowed_zones = reloaded.allowed_zones.len(),
                            "Configuration reloaded"
                        );
                    }
                    Err(e) => error!(error = %e, "Configuration reload failed; keeping previous"),
                }
            }
        });
    }

    let result = server.run().await;

    if let Some(pid_file) = &config.listener.pid_file {
        if let Err(e) = std::fs::remove_file(pid_file) {
            warn!(path = %pid_file.display(), error = %e, "Failed to remove PID file");
        }
    }

    result.context("listener failed")
}

fn load_records(path: &PathBuf) -> Result<Vec<ResourceRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    // Malformed zone data is fatal for this operation: retrying cannot
    // succeed without the file being corrected.
    serde_json::from_str(&content)
        .with_context(|| format!("bad zone data in {}", path.display()))
}

async fn run_sync(config: &Config, zone: &str, records_path: &PathBuf) -> Result<()> {
    let engine = build_engine(config)?;
    let records = load_records(records_path)?;

    let report = engine
        .sync_zone(zone, &records)
        .await
        .with_context(|| format!("failed to sync zone {zone}"))?;

    println!(
        "{}: {} replaced, {} deleted",
        report.zone, report.replaced, report.deleted
    );
    if !report.skipped_types.is_empty() {
        println!("skipped unsupported types: {}", report.skipped_types.join(", "));
    }
    Ok(())
}

async fn run_export(config: &Config, zone: &str, output: Option<&PathBuf>) -> Result<()> {
    let engine = build_engine(config)?;
    let text = engine
        .export_zone(zone)
        .await
        .with_context(|| format!("failed to export zone {zone}"))?;

    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{text}"),
    }
    Ok(())
}

async fn run_remove(config: &Config, zone: &str) -> Result<()> {
    let engine = build_engine(config)?;
    engine
        .remove_zone(zone)
        .await
        .with_context(|| format!("failed to remove zone {zone}"))?;
    println!("removed {zone}");
    Ok(())
}

fn validate_config(path: Option<PathBuf>, verbose: bool) -> Result<()> {
    let config_path = find_config_file(path).context("no configuration file found")?;
    println!("Validating {}", config_path.display());

    let config = Config::from_file(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    config.validate().context("configuration is invalid")?;

    if verbose {
        println!("  listener: {}:{}", config.listener.address, config.listener.port);
        println!("  api url: {}", if config.api.url.is_empty() { "(unset)" } else { &config.api.url });
        println!("  ns policy: {}", config.policy.mode.as_str());
        println!("  allowed zones: {}", config.allowed_zones.len());
        println!(
            "  resync command: {}",
            if config.dispatch.resync_command.is_empty() {
                "(unset)".to_string()
            } else {
                config.dispatch.resync_command.join(" ")
            }
        );
    }

    println!("Configuration is valid");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Validate { verbose } = &cli.command {
        return validate_config(cli.config, *verbose);
    }

    let (config, config_path) = load_config(cli.config.clone(), cli.quiet)?;
    init_logging(&config, cli.log_level.as_deref(), cli.quiet)?;

    match &cli.command {
        Commands::Listen => run_listener(config, config_path).await,
        Commands::Sync { zone, records } => run_sync(&config, zone, records).await,
        Commands::Export { zone, output } => run_export(&config, zone, output.as_ref()).await,
        Commands::Remove { zone } => run_remove(&config, zone).await,
        Commands::Validate { .. } => unreachable!(),
    }
}
