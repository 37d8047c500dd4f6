//! Prometheus Metrics Registry - Engine Observability
//!
//! Registers and exposes Prometheus metrics on :9090 for Grafana
//! dashboards. Covers analysis throughput, alert dispatch, rate
//! limiting and the opportunities found per poll cycle.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

/// Centralized Prometheus metrics for the engine.
///
/// All metrics follow the naming convention `odds_sentinel_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Analyses run, one per match per cycle.
    pub analyses_run: IntCounter,
    /// Alerts accepted by the dispatcher, by alert type.
    pub alerts_dispatched: IntCounterVec,
    /// Alerts dropped by the rate limiter.
    pub alerts_rate_limited: IntCounter,
    /// Channel deliveries that failed, by channel.
    pub delivery_failures: IntCounterVec,
    /// Value bets found in the last cycle.
    pub value_bets_last_cycle: IntGauge,
    /// Arbitrage opportunities found, cumulative.
    pub arbitrage_found: IntCounter,
    /// Poll cycle duration histogram (milliseconds).
    pub cycle_duration_ms: HistogramVec,
    /// Snapshot source errors.
    pub source_errors: IntCounter,
    /// Last observed bankroll.
    pub bankroll: Gauge,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let analyses_run = IntCounter::new(
            "odds_sentinel_analyses_total",
            "Match analyses run",
        )?;

        let alerts_dispatched = IntCounterVec::new(
            Opts::new(
                "odds_sentinel_alerts_dispatched_total",
                "Alerts accepted by the dispatcher",
            ),
            &["type"],
        )?;

        let alerts_rate_limited = IntCounter::new(
            "odds_sentinel_alerts_rate_limited_total",
            "Alerts dropped by the hourly rate limit",
        )?;

        let delivery_failures = IntCounterVec::new(
            Opts::new(
                "odds_sentinel_delivery_failures_total",
                "Failed channel deliveries",
            ),
            &["channel"],
        )?;

        let value_bets_last_cycle = IntGauge::new(
            "odds_sentinel_value_bets",
            "Value bets found in the last poll cycle",
        )?;

        let arbitrage_found = IntCounter::new(
            "odds_sentinel_arbitrage_found_total",
            "Arbitrage opportunities found",
        )?;

        let cycle_duration_ms = HistogramVec::new(
            HistogramOpts::new(
                "odds_sentinel_cycle_duration_ms",
                "Poll cycle duration in milliseconds",
            )
            .buckets(vec![1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]),
            &["outcome"],
        )?;

        let source_errors = IntCounter::new(
            "odds_sentinel_source_errors_total",
            "Snapshot source fetch failures",
        )?;

        let bankroll = Gauge::new("odds_sentinel_bankroll", "Last observed bankroll")?;

        // Register all metrics
        registry.register(Box::new(analyses_run.clone()))?;
        registry.register(Box::new(alerts_dispatched.clone()))?;
        registry.register(Box::new(alerts_rate_limited.clone()))?;
        registry.register(Box::new(delivery_failures.clone()))?;
        registry.register(Box::new(value_bets_last_cycle.clone()))?;
        registry.register(Box::new(arbitrage_found.clone()))?;
        registry.register(Box::new(cycle_duration_ms.clone()))?;
        registry.register(Box::new(source_errors.clone()))?;
        registry.register(Box::new(bankroll.clone()))?;

        Ok(Self {
            registry,
            analyses_run,
            alerts_dispatched,
            alerts_rate_limited,
            delivery_failures,
            value_bets_last_cycle,
            arbitrage_found,
            cycle_duration_ms,
            source_errors,
            bankroll,
        })
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8(buffer).unwrap_or_default()
    }

    /// Serve `/metrics` and `/live` on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new()
            .route(
                "/metrics",
                get(move || {
                    let metrics = Arc::clone(&metrics_self);
                    async move { metrics.render() }
                }),
            )
            .route("/live", get(|| async { "OK" }));

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}
