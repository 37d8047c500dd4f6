//! Odds Source Port - Match Snapshot Interface
//!
//! Defines where the monitor gets its predictions and bookmaker prices.
//! Implementors may read files, poll an HTTP API or replay history.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::market::{MarketOdds, Prediction};

/// Prediction and current prices for one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
  /// Stable match identifier, used to diff consecutive snapshots.
  pub match_id: String,
  pub home_team: String,
  pub away_team: String,
  /// Model output for the match.
  pub prediction: Prediction,
  /// Current prices, one entry per bookmaker.
  pub odds: Vec<MarketOdds>,
  /// Set on the last snapshot before kick-off.
  #[serde(default)]
  pub closing: bool,
}

impl MatchSnapshot {
  /// "Home vs Away" label used in alert titles.
  pub fn label(&self) -> String {
    format!("{} vs {}", self.home_team, self.away_team)
  }
}

/// Trait for match snapshot providers.
#[async_trait]
pub trait OddsSource: Send + Sync + 'static {
  /// Fetch the latest snapshot of every tracked match.
  async fn fetch_snapshots(&self) -> anyhow::Result<Vec<MatchSnapshot>>;
}
