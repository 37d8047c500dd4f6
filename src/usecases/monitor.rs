//! Odds Monitor - Periodic Poll Loop
//!
//! On every interval:
//! 1. Fetch match snapshots from the `OddsSource`
//! 2. Analyze each match and evaluate alert rules
//! 3. Diff prices against the previous snapshot (odds movement)
//! 4. Track first value-bet prices and score them on the close (CLV)
//! 5. Dispatch everything in raise order
//! 6. Forget matches that left the feed without closing
//!
//! Shutdown is honoured between cycles only.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use rust_decimal::prelude::ToPrimitive;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::adapters::metrics::MetricsRegistry;
use crate::config::AppConfig;
use crate::domain::bankroll::BankrollState;
use crate::domain::market::{MarketOdds, OutcomeKey};
use crate::domain::recommendation::BettingAnalysis;
use crate::ports::odds_source::{MatchSnapshot, OddsSource};

use super::alert_dispatcher::{AlertDispatcher, DeliveryHandles, DispatchOutcome};
use super::alert_rules::{AlertRuleEngine, RaisedAlert};
use super::recommendation_builder::RecommendationBuilder;

/// Counters for one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
  /// Matches analyzed.
  pub matches: usize,
  /// Value bets found across all matches.
  pub value_bets: usize,
  /// Arbitrage opportunities found.
  pub arbitrage: usize,
  /// Alerts raised by the rule engine.
  pub alerts_raised: usize,
  /// Alerts accepted by the dispatcher.
  pub alerts_dispatched: usize,
  /// Alerts dropped by the rate limiter.
  pub rate_limited: usize,
  /// Whether the source failed and the cycle was skipped.
  pub skipped: bool,
}

/// Poll loop tying the source, builder, rules and dispatcher together.
pub struct OddsMonitor<S: OddsSource> {
  /// Snapshot provider.
  source: Arc<S>,
  /// Analysis pipeline.
  builder: RecommendationBuilder,
  /// Rule engine.
  rules: AlertRuleEngine,
  /// Alert dispatcher (owned; one consumer).
  dispatcher: AlertDispatcher,
  /// Bankroll stakes are sized against.
  bankroll: f64,
  /// Time between cycles.
  poll_interval: Duration,
  /// Last seen books per match id.
  previous: HashMap<String, Vec<MarketOdds>>,
  /// First price at which each (match, outcome) was flagged as value.
  taken: HashMap<(String, OutcomeKey), f64>,
  /// Optional metrics sink.
  metrics: Option<Arc<MetricsRegistry>>,
}

impl<S: OddsSource> OddsMonitor<S> {
  /// Create a monitor from config and a ready dispatcher.
  pub fn new(source: Arc<S>, config: &AppConfig, dispatcher: AlertDispatcher) -> Self {
    Self {
      source,
      builder: RecommendationBuilder::new(&config.analysis),
      rules: AlertRuleEngine::new(
        config.alerts.effective_rules(),
        config.alerts.inefficiency_threshold,
      ),
      dispatcher,
      bankroll: config.engine.bankroll,
      poll_interval: Duration::from_secs(config.engine.poll_interval_seconds),
      previous: HashMap::new(),
      taken: HashMap::new(),
      metrics: None,
    }
  }

  /// Attach a metrics registry.
  #[must_use]
  pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
    self.metrics = Some(metrics);
    self
  }

  /// Dispatcher, for store queries.
  pub fn dispatcher(&self) -> &AlertDispatcher {
    &self.dispatcher
  }

  /// Dispatcher, for store updates (mark read, dismiss, ...).
  pub fn dispatcher_mut(&mut self) -> &mut AlertDispatcher {
    &mut self.dispatcher
  }

  /// Bankroll currently used for stake sizing.
  pub fn bankroll(&self) -> f64 {
    self.bankroll
  }

  /// Run the poll loop until shutdown.
  #[instrument(skip(self, shutdown_rx), name = "odds_monitor")]
  pub async fn run(&mut self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
    info!(
      interval_secs = self.poll_interval.as_secs(),
      bankroll = self.bankroll,
      "Odds monitor starting"
    );

    let mut ticker = tokio::time::interval(self.poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
      tokio::select! {
        _ = shutdown_rx.recv() => {
          info!("Shutdown signal received, stopping monitor");
          break;
        }
        _ = ticker.tick() => {
          let summary = self.poll_once().await;
          debug!(?summary, "Cycle finished");
        }
      }
    }

    Ok(())
  }

  /// Run one poll cycle.
  #[instrument(skip(self), name = "poll_cycle")]
  pub async fn poll_once(&mut self) -> CycleSummary {
    let start = Instant::now();

    let snapshots = match self.source.fetch_snapshots().await {
      Ok(snapshots) => snapshots,
      Err(e) => {
        warn!(error = %e, "Snapshot fetch failed, skipping cycle");
        if let Some(metrics) = &self.metrics {
          metrics.source_errors.inc();
          metrics
            .cycle_duration_ms
            .with_label_values(&["skipped"])
            .observe(start.elapsed().as_secs_f64() * 1000.0);
        }
        return CycleSummary {
          skipped: true,
          ..CycleSummary::default()
        };
      }
    };

    let mut summary = CycleSummary::default();
    let mut raised = Vec::new();

    for snapshot in &snapshots {
      let Some(analysis) = self.analyze(snapshot) else {
        debug!(match_id = %snapshot.match_id, "Snapshot has no odds, skipping");
        continue;
      };

      summary.matches += 1;
      summary.value_bets += analysis.value_bets().count();
      summary.arbitrage += analysis.arbitrage_opportunities.len();

      raised.extend(self.market_events(snapshot, &analysis));
    }

    self.forget_absent(&snapshots);

    summary.alerts_raised = raised.len();
    for outcome in self.dispatcher.dispatch_all(raised) {
      self.record_outcome(outcome, &mut summary);
    }

    if let Some(metrics) = &self.metrics {
      metrics.analyses_run.inc_by(summary.matches as u64);
      metrics.arbitrage_found.inc_by(summary.arbitrage as u64);
      metrics.value_bets_last_cycle.set(summary.value_bets as i64);
      metrics
        .cycle_duration_ms
        .with_label_values(&["ok"])
        .observe(start.elapsed().as_secs_f64() * 1000.0);
    }

    info!(
      matches = summary.matches,
      value_bets = summary.value_bets,
      arbitrage = summary.arbitrage,
      alerts = summary.alerts_dispatched,
      rate_limited = summary.rate_limited,
      elapsed_ms = start.elapsed().as_millis() as u64,
      "Poll cycle complete"
    );

    summary
  }

  /// Record a new bankroll state: resizes stakes and checks the threshold rule.
  pub fn observe_bankroll(&mut self, state: &BankrollState) -> Option<DispatchOutcome> {
    let current = state.current_bankroll.to_f64().unwrap_or(0.0);
    self.bankroll = current.max(0.0);
    if let Some(metrics) = &self.metrics {
      metrics.bankroll.set(current);
    }

    let raised = self.rules.evaluate_bankroll(state)?;
    let outcome = self.dispatcher.dispatch(raised);
    if let Some(metrics) = &self.metrics {
      match &outcome {
        DispatchOutcome::Accepted { .. } => metrics
          .alerts_dispatched
          .with_label_values(&["bankroll_threshold"])
          .inc(),
        DispatchOutcome::RateLimited => metrics.alerts_rate_limited.inc(),
      }
    }
    Some(outcome)
  }

  fn analyze(&self, snapshot: &MatchSnapshot) -> Option<BettingAnalysis> {
    match snapshot.odds.as_slice() {
      [] => None,
      [single] => Some(self.builder.analyze(&snapshot.prediction, single, self.bankroll)),
      books => Some(
        self
          .builder
          .analyze_books(&snapshot.prediction, books, self.bankroll),
      ),
    }
  }

  /// Rule alerts plus odds movement and CLV for one snapshot, in raise order.
  fn market_events(
    &mut self,
    snapshot: &MatchSnapshot,
    analysis: &BettingAnalysis,
  ) -> Vec<RaisedAlert> {
    let label = snapshot.label();
    let mut raised = self.rules.evaluate_match(&label, analysis);

    if let Some(previous) = self.previous.get(&snapshot.match_id) {
      for current in &snapshot.odds {
        let before = previous
          .iter()
          .find(|book| book.bookmaker == current.bookmaker);
        if let Some(before) = before {
          raised.extend(self.rules.evaluate_odds_movement(&label, before, current));
        }
      }
    }

    for rec in analysis.value_bets() {
      self
        .taken
        .entry((snapshot.match_id.clone(), rec.outcome))
        .or_insert(rec.market_odds);
    }

    if snapshot.closing {
      let mut taken: Vec<(OutcomeKey, f64)> = self
        .taken
        .iter()
        .filter(|((match_id, _), _)| *match_id == snapshot.match_id)
        .map(|((_, outcome), odds)| (*outcome, *odds))
        .collect();
      taken.sort_by_key(|(outcome, _)| *outcome);

      for (outcome, taken_odds) in taken {
        if let Some(closing) = best_price(&snapshot.odds, outcome) {
          raised.extend(
            self
              .rules
              .evaluate_closing_line(&label, outcome, taken_odds, closing),
          );
        }
      }

      self.taken.retain(|(match_id, _), _| *match_id != snapshot.match_id);
      self.previous.remove(&snapshot.match_id);
    } else {
      self
        .previous
        .insert(snapshot.match_id.clone(), snapshot.odds.clone());
    }

    raised
  }

  /// Drop price history for matches missing from a successful fetch.
  fn forget_absent(&mut self, snapshots: &[MatchSnapshot]) {
    let live: HashSet<&str> = snapshots.iter().map(|s| s.match_id.as_str()).collect();
    let before = self.previous.len();

    self.previous.retain(|match_id, _| live.contains(match_id.as_str()));
    self
      .taken
      .retain(|(match_id, _), _| live.contains(match_id.as_str()));

    let dropped = before - self.previous.len();
    if dropped > 0 {
      debug!(dropped, tracked = self.previous.len(), "Forgot matches absent from feed");
    }
  }

  fn record_outcome(&self, outcome: DispatchOutcome, summary: &mut CycleSummary) {
    match outcome {
      DispatchOutcome::Accepted { alert_id, deliveries } => {
        summary.alerts_dispatched += 1;
        if let Some(metrics) = &self.metrics {
          if let Some(alert) = self.dispatcher.alerts().iter().find(|a| a.id == alert_id) {
            metrics
              .alerts_dispatched
              .with_label_values(&[alert.alert_type.as_str()])
              .inc();
          }
          track_failures(deliveries, Arc::clone(metrics));
        }
      }
      DispatchOutcome::RateLimited => {
        summary.rate_limited += 1;
        if let Some(metrics) = &self.metrics {
          metrics.alerts_rate_limited.inc();
        }
      }
    }
  }
}

/// Best valid price for an outcome across books.
fn best_price(books: &[MarketOdds], outcome: OutcomeKey) -> Option<f64> {
  books
    .iter()
    .filter_map(|book| book.get(outcome))
    .filter(|p| p.is_finite() && *p >= 1.0)
    .max_by(f64::total_cmp)
}

/// Count failed deliveries in the background without blocking the cycle.
fn track_failures(deliveries: DeliveryHandles, metrics: Arc<MetricsRegistry>) {
  if deliveries.is_empty() {
    return;
  }
  tokio::spawn(async move {
    for report in deliveries.join().await {
      if !report.success {
        metrics
          .delivery_failures
          .with_label_values(&[&report.channel.to_string()])
          .inc();
      }
    }
  });
}
