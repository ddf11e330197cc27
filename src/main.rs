use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use argocd_endpoint::clock::SystemClock;
use argocd_endpoint::config::{default_config_path, ResolvedConfig};
use argocd_endpoint::controller::{EndpointConnecter, Reconciler, SweepSummary};
use argocd_endpoint::duration::{format_duration, parse_duration};
use argocd_endpoint::events::LogRecorder;
use argocd_endpoint::models::READY_CONDITION;
use argocd_endpoint::storage::{ClusterStore, JsonFileStore};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "argocd-endpoint")]
#[command(about = "Mint Argo CD account tokens and keep them in endpoint secrets")]
struct Cli {
    /// Path to config file.
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Run with debug logging.
    #[arg(short, long)]
    debug: bool,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// How often `run` sweeps all endpoints (e.g. "5m", "1h30m").
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_arg)]
    poll: Option<Duration>,

    /// Maximum number of endpoints reconciled at once.
    #[arg(long, value_name = "N")]
    max_reconcile_rate: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Show current configuration
    Config,
    /// Reconcile every endpoint once
    Reconcile,
    /// Reconcile every endpoint on each poll interval until interrupted
    Run,
    /// Show the readiness of every endpoint
    Status,
}

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

fn init_tracing(debug: bool, format: LogFormat) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .json(),
            )
            .init(),
    }
}

fn build_reconciler(config: &ResolvedConfig, store: Arc<dyn ClusterStore>) -> Reconciler {
    let connecter = EndpointConnecter::new(
        store.clone(),
        Arc::new(LogRecorder),
        Arc::new(SystemClock),
    )
    .with_timeout(config.controller.http_timeout);

    Reconciler::new(store, Arc::new(connecter))
        .with_max_concurrent(config.controller.max_concurrent_reconciles)
}

fn report(summary: &SweepSummary) {
    for (name, outcome) in &summary.succeeded {
        tracing::info!(endpoint = %name, ?outcome, "Endpoint reconciled");
    }
    tracing::info!(
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        "Sweep finished"
    );
}

async fn run_loop(reconciler: &Reconciler, poll_interval: Duration) -> Result<()> {
    tracing::info!(poll = %format_duration(poll_interval), "Starting controller");

    loop {
        match reconciler.reconcile_all().await {
            Ok(summary) => report(&summary),
            Err(err) => tracing::warn!(error = %err, "Sweep failed"),
        }

        let sleep = tokio::time::sleep(poll_interval);
        tokio::pin!(sleep);

        tokio::select! {
            _ = &mut sleep => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                return Ok(());
            }
        }
    }
}

async fn print_status(store: &dyn ClusterStore) -> Result<()> {
    let endpoints = store
        .list_endpoints()
        .await
        .context("Failed to list endpoints")?;

    if endpoints.is_empty() {
        println!("No endpoints found.");
        return Ok(());
    }

    for endpoint in endpoints {
        let secret = endpoint
            .secret_ref()
            .map(|r| format!("{}/{}", r.namespace, r.name))
            .unwrap_or_else(|| "-".to_string());
        let ready = endpoint
            .status
            .condition(READY_CONDITION)
            .map(|c| format!("{:?} ({})", c.status, c.reason))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}\taccount={}\tsecret={}\tready={}",
            endpoint.name(),
            endpoint.account(),
            secret,
            ready
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.log_format);

    let mut config = ResolvedConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;
    if let Some(poll) = cli.poll {
        config.controller.poll_interval = poll;
    }
    if let Some(max) = cli.max_reconcile_rate {
        config.controller.max_concurrent_reconciles = max;
    }

    let store: Arc<dyn ClusterStore> = Arc::new(JsonFileStore::new(&config.data_dir));

    match cli.command {
        Command::Config => {
            println!("# Config file: {}", cli.config.display());
            print!("{}", config.to_toml()?);
        }
        Command::Reconcile => {
            let reconciler = build_reconciler(&config, store);
            let summary = reconciler.reconcile_all().await?;
            report(&summary);
            if !summary.is_clean() {
                anyhow::bail!("{} endpoint(s) failed to reconcile", summary.failed.len());
            }
        }
        Command::Run => {
            let reconciler = build_reconciler(&config, store);
            run_loop(&reconciler, config.controller.poll_interval).await?;
        }
        Command::Status => print_status(store.as_ref()).await?,
    }

    Ok(())
}
