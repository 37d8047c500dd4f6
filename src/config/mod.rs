//! Configuration Module - TOML-based Engine Configuration
//!
//! Loads and validates configuration from `config.toml`.
//! Every analysis threshold, alert rule and channel endpoint is
//! externalized here - nothing is hardcoded in the usecases layer.

pub mod loader;

use serde::Deserialize;

use crate::domain::alert::AlertRule;

/// Top-level engine configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the poll loop begins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
  /// Engine identity and poll cadence.
  #[serde(default)]
  pub engine: EngineConfig,
  /// Recommendation thresholds.
  #[serde(default)]
  pub analysis: AnalysisConfig,
  /// Alert rules and dispatcher limits.
  #[serde(default)]
  pub alerts: AlertsConfig,
  /// Notification channel endpoints.
  #[serde(default)]
  pub channels: ChannelsConfig,
  /// Where odds snapshots are read from.
  #[serde(default)]
  pub source: SourceConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Engine identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
  /// Human-readable engine name.
  #[serde(default = "default_name")]
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Seconds between odds refreshes.
  #[serde(default = "default_poll_interval")]
  pub poll_interval_seconds: u64,
  /// Bankroll the stake suggestions are sized against.
  #[serde(default = "default_bankroll")]
  pub bankroll: f64,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      name: default_name(),
      log_level: default_log_level(),
      poll_interval_seconds: default_poll_interval(),
      bankroll: default_bankroll(),
    }
  }
}

/// Thresholds used by the recommendation builder.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
  /// Kelly multiplier (0.25 = quarter-Kelly).
  #[serde(default = "default_kelly_fraction")]
  pub kelly_fraction: f64,
  /// Cap on a single fractional-Kelly stake, as a bankroll fraction.
  #[serde(default = "default_max_stake_fraction")]
  pub max_stake_fraction: f64,
  /// Flat stake in percent of bankroll.
  #[serde(default = "default_fixed_stake_pct")]
  pub fixed_stake_pct: f64,
  /// Minimum EV (percent) for a value bet.
  #[serde(default = "default_min_value_ev")]
  pub min_value_ev: f64,
  /// Minimum EV (percent) for a strong value bet.
  #[serde(default = "default_strong_value_ev")]
  pub strong_value_ev: f64,
  /// Minimum confidence for a strong value bet.
  #[serde(default = "default_strong_value_confidence")]
  pub strong_value_confidence: f64,
  /// Prediction confidence below which a warning is raised.
  #[serde(default = "default_min_confidence")]
  pub min_confidence: f64,
  /// Overall margin (percent) above which a warning is raised.
  #[serde(default = "default_high_margin")]
  pub high_margin_threshold: f64,
  /// Minimum EV (percent) for Kelly strategy advice.
  #[serde(default = "default_kelly_advice_min_ev")]
  pub kelly_advice_min_ev: f64,
  /// Margin (percent) at which efficiency reaches 0.
  #[serde(default = "default_efficiency_margin_scale")]
  pub efficiency_margin_scale: f64,
  /// Length cap of the top recommendation list.
  #[serde(default = "default_max_top")]
  pub max_top_recommendations: usize,
}

impl Default for AnalysisConfig {
  fn default() -> Self {
    Self {
      kelly_fraction: default_kelly_fraction(),
      max_stake_fraction: default_max_stake_fraction(),
      fixed_stake_pct: default_fixed_stake_pct(),
      min_value_ev: default_min_value_ev(),
      strong_value_ev: default_strong_value_ev(),
      strong_value_confidence: default_strong_value_confidence(),
      min_confidence: default_min_confidence(),
      high_margin_threshold: default_high_margin(),
      kelly_advice_min_ev: default_kelly_advice_min_ev(),
      efficiency_margin_scale: default_efficiency_margin_scale(),
      max_top_recommendations: default_max_top(),
    }
  }
}

/// Alert rule and dispatcher configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
  /// Rolling-hour alert cap.
  #[serde(default = "default_max_per_hour")]
  pub max_per_hour: usize,
  /// Alerts kept in the in-memory store before the oldest is evicted.
  #[serde(default = "default_max_stored")]
  pub max_stored: usize,
  /// Market efficiency below which an inefficiency alert is raised.
  #[serde(default = "default_inefficiency_threshold")]
  pub inefficiency_threshold: f64,
  /// Alert rules. Empty means `AlertRule::default_rules()`.
  #[serde(default)]
  pub rules: Vec<AlertRule>,
}

impl AlertsConfig {
  /// Configured rules, or the built-in defaults when none are set.
  pub fn effective_rules(&self) -> Vec<AlertRule> {
    if self.rules.is_empty() {
      AlertRule::default_rules()
    } else {
      self.rules.clone()
    }
  }
}

impl Default for AlertsConfig {
  fn default() -> Self {
    Self {
      max_per_hour: default_max_per_hour(),
      max_stored: default_max_stored(),
      inefficiency_threshold: default_inefficiency_threshold(),
      rules: Vec::new(),
    }
  }
}

/// Notification channel configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelsConfig {
  /// Log alerts through tracing.
  #[serde(default = "default_true")]
  pub console: bool,
  /// Browser notifications (no-op outside a browser context).
  #[serde(default = "default_true")]
  pub browser: bool,
  /// Terminal bell on interactive terminals.
  #[serde(default = "default_true")]
  pub sound: bool,
  /// HTTP mail API, if email delivery is wanted.
  #[serde(default)]
  pub email: Option<EmailConfig>,
  /// Outbound webhooks.
  #[serde(default)]
  pub webhooks: Vec<WebhookConfig>,
}

impl Default for ChannelsConfig {
  fn default() -> Self {
    Self {
      console: true,
      browser: true,
      sound: true,
      email: None,
      webhooks: Vec::new(),
    }
  }
}

/// HTTP mail API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
  /// Endpoint receiving `{from, to, subject, html, text}` as JSON.
  pub api_url: String,
  /// Sender address.
  pub from: String,
  /// Recipient addresses.
  pub to: Vec<String>,
  /// Environment variable holding the bearer token, if any.
  #[serde(default)]
  pub api_key_env: Option<String>,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
}

/// Payload flavour of a webhook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookFormat {
  /// `{type, alert: {...}}` JSON.
  #[default]
  Generic,
  /// Slack incoming-webhook attachment card.
  Slack,
  /// Discord embed card.
  Discord,
}

/// Outbound webhook configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
  /// Target URL.
  pub url: String,
  /// Payload format.
  #[serde(default)]
  pub format: WebhookFormat,
  /// Environment variable holding an HMAC signing secret, if any.
  #[serde(default)]
  pub secret_env: Option<String>,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
}

/// Odds snapshot source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
  /// JSON file holding the latest match snapshots.
  #[serde(default = "default_snapshot_path")]
  pub snapshot_path: String,
}

impl Default for SourceConfig {
  fn default() -> Self {
    Self {
      snapshot_path: default_snapshot_path(),
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: default_metrics_addr(),
    }
  }
}

// Default value functions for serde

fn default_name() -> String {
  "odds-sentinel".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_poll_interval() -> u64 {
  60
}

fn default_bankroll() -> f64 {
  1000.0
}

fn default_true() -> bool {
  true
}

fn default_kelly_fraction() -> f64 {
  0.25
}

fn default_max_stake_fraction() -> f64 {
  0.10
}

fn default_fixed_stake_pct() -> f64 {
  2.0
}

fn default_min_value_ev() -> f64 {
  2.0
}

fn default_strong_value_ev() -> f64 {
  10.0
}

fn default_strong_value_confidence() -> f64 {
  0.7
}

fn default_min_confidence() -> f64 {
  0.6
}

fn default_high_margin() -> f64 {
  8.0
}

fn default_kelly_advice_min_ev() -> f64 {
  5.0
}

fn default_efficiency_margin_scale() -> f64 {
  25.0
}

fn default_max_top() -> usize {
  5
}

fn default_max_per_hour() -> usize {
  20
}

fn default_max_stored() -> usize {
  100
}

fn default_inefficiency_threshold() -> f64 {
  0.7
}

fn default_timeout() -> u64 {
  10
}

fn default_snapshot_path() -> String {
  "data/snapshots.json".to_string()
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}
