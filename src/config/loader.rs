//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    rules = config.alerts.effective_rules().len(),
    webhooks = config.channels.webhooks.len(),
    kelly = config.analysis.kelly_fraction,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Positive bankroll and poll interval
/// - Valid fraction/probability ranges
/// - Sensible alert limits
/// - Non-empty channel endpoints
fn validate_config(config: &AppConfig) -> Result<()> {
  // Engine validation
  anyhow::ensure!(
    config.engine.bankroll > 0.0,
    "engine.bankroll must be positive, got {}",
    config.engine.bankroll
  );
  anyhow::ensure!(
    config.engine.poll_interval_seconds > 0,
    "engine.poll_interval_seconds must be positive"
  );

  // Analysis validation
  let analysis = &config.analysis;
  anyhow::ensure!(
    analysis.kelly_fraction > 0.0 && analysis.kelly_fraction <= 1.0,
    "Kelly fraction must be in (0, 1], got {}",
    analysis.kelly_fraction
  );
  anyhow::ensure!(
    analysis.max_stake_fraction > 0.0 && analysis.max_stake_fraction <= 1.0,
    "max_stake_fraction must be in (0, 1], got {}",
    analysis.max_stake_fraction
  );
  anyhow::ensure!(
    analysis.fixed_stake_pct > 0.0 && analysis.fixed_stake_pct <= 100.0,
    "fixed_stake_pct must be in (0, 100], got {}",
    analysis.fixed_stake_pct
  );
  anyhow::ensure!(
    analysis.strong_value_ev >= analysis.min_value_ev,
    "strong_value_ev ({}) must not be below min_value_ev ({})",
    analysis.strong_value_ev,
    analysis.min_value_ev
  );
  anyhow::ensure!(
    (0.0..=1.0).contains(&analysis.min_confidence)
      && (0.0..=1.0).contains(&analysis.strong_value_confidence),
    "confidence thresholds must be in [0, 1]"
  );
  anyhow::ensure!(
    analysis.efficiency_margin_scale > 0.0,
    "efficiency_margin_scale must be positive"
  );
  anyhow::ensure!(
    analysis.max_top_recommendations > 0,
    "max_top_recommendations must be positive"
  );

  // Alert validation
  anyhow::ensure!(
    config.alerts.max_per_hour > 0,
    "alerts.max_per_hour must be positive"
  );
  anyhow::ensure!(
    config.alerts.max_stored > 0,
    "alerts.max_stored must be positive"
  );
  anyhow::ensure!(
    (0.0..=1.0).contains(&config.alerts.inefficiency_threshold),
    "alerts.inefficiency_threshold must be in [0, 1], got {}",
    config.alerts.inefficiency_threshold
  );
  for (i, rule) in config.alerts.rules.iter().enumerate() {
    anyhow::ensure!(
      !rule.channels.is_empty(),
      "Alert rule {} ({}) has no channels",
      i,
      rule.alert_type
    );
  }

  // Channel validation
  if let Some(email) = &config.channels.email {
    anyhow::ensure!(!email.api_url.is_empty(), "Email api_url must not be empty");
    anyhow::ensure!(!email.to.is_empty(), "Email needs at least one recipient");
  }
  for (i, hook) in config.channels.webhooks.iter().enumerate() {
    anyhow::ensure!(!hook.url.is_empty(), "Webhook {} has an empty url", i);
  }

  // Source validation
  anyhow::ensure!(
    !config.source.snapshot_path.is_empty(),
    "source.snapshot_path must not be empty"
  );

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::WebhookFormat;
  use crate::domain::alert::{AlertType, ChannelKind};

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_empty_config_uses_defaults() {
    let config = parse_config("").unwrap();
    assert_eq!(config.alerts.max_per_hour, 20);
    assert_eq!(config.analysis.max_top_recommendations, 5);
    assert!(!config.alerts.effective_rules().is_empty());
  }

  #[test]
  fn test_full_config() {
    let config = parse_config(
      r#"
      [engine]
      name = "test"
      bankroll = 500.0

      [analysis]
      kelly_fraction = 0.5

      [alerts]
      max_per_hour = 5

      [[alerts.rules]]
      alert_type = "arbitrage"
      channels = ["webhook"]
      priority = "critical"

      [[channels.webhooks]]
      url = "https://hooks.example.com/x"
      format = "slack"
      "#,
    )
    .unwrap();

    assert_eq!(config.engine.name, "test");
    assert!((config.analysis.kelly_fraction - 0.5).abs() < f64::EPSILON);
    assert_eq!(config.alerts.rules.len(), 1);
    assert_eq!(config.alerts.rules[0].alert_type, AlertType::Arbitrage);
    assert_eq!(config.alerts.rules[0].channels, vec![ChannelKind::Webhook]);
    assert_eq!(config.channels.webhooks[0].format, WebhookFormat::Slack);
  }

  #[test]
  fn test_rejects_bad_kelly() {
    let result = parse_config("[analysis]\nkelly_fraction = 1.5\n");
    assert!(result.is_err());
  }

  #[test]
  fn test_rejects_rule_without_channels() {
    let result = parse_config(
      r#"
      [[alerts.rules]]
      alert_type = "value_bet"
      channels = []
      priority = "low"
      "#,
    );
    assert!(result.is_err());
  }
}
