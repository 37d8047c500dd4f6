//! odds-sentinel - Entry Point
//!
//! Loads configuration, wires channels, dispatcher and snapshot source,
//! then runs the odds monitor until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml (or `$ODDS_SENTINEL_CONFIG`) + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Build alert channels and the dispatcher
//! 4. Spawn Prometheus metrics server (/metrics + /live)
//! 5. Spawn the odds monitor poll loop
//! 6. Wait for SIGINT → broadcast shutdown → drain

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use odds_sentinel::adapters::channels::build_channels;
use odds_sentinel::adapters::metrics::MetricsRegistry;
use odds_sentinel::adapters::source::JsonFileSource;
use odds_sentinel::config;
use odds_sentinel::usecases::{AlertDispatcher, OddsMonitor};

/// Environment variable overriding the config path.
const CONFIG_ENV: &str = "ODDS_SENTINEL_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .with_context(|| format!("Failed to load configuration from {config_path}"))?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.engine.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.engine.name,
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path,
        bankroll = config.engine.bankroll,
        poll_interval_secs = config.engine.poll_interval_seconds,
        "Starting odds-sentinel"
    );

    // ── 3. Shutdown signal channel ──────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 4. Channels + dispatcher ────────────────────────────
    let mut dispatcher = AlertDispatcher::new(&config.alerts);
    for channel in build_channels(&config.channels).context("Failed to build alert channels")? {
        dispatcher.register_channel(channel);
    }

    // ── 5. Metrics server ───────────────────────────────────
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to create metrics registry")?);
    let metrics_handle = if config.metrics.enabled {
        let server = Arc::clone(&metrics);
        let bind_address = config.metrics.bind_address.clone();
        let metrics_shutdown = shutdown_tx.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = server.serve(bind_address, metrics_shutdown).await {
                error!(error = %e, "Metrics server failed");
            }
        }))
    } else {
        warn!("Metrics export disabled");
        None
    };

    // ── 6. Odds monitor ─────────────────────────────────────
    let source = Arc::new(JsonFileSource::new(&config.source.snapshot_path));
    let mut monitor = OddsMonitor::new(source, &config, dispatcher).with_metrics(Arc::clone(&metrics));
    let monitor_shutdown = shutdown_tx.subscribe();
    let monitor_handle = tokio::spawn(async move {
        if let Err(e) = monitor.run(monitor_shutdown).await {
            error!(error = %e, "Odds monitor failed");
        }
    });

    info!("All tasks spawned, engine is running");

    // ── 7. Wait for SIGINT ──────────────────────────────────
    signal::ctrl_c().await.context("Failed to listen for SIGINT")?;
    info!("SIGINT received, initiating graceful shutdown");

    let _ = shutdown_tx.send(());

    // Monitor stops between cycles; give an in-flight cycle time to finish
    if tokio::time::timeout(Duration::from_secs(30), monitor_handle).await.is_err() {
        warn!("Odds monitor did not stop within 30s");
    }
    if let Some(handle) = metrics_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete");
    Ok(())
}
