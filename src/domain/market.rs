//! Market and prediction records.
//!
//! Defines the outcome keys the engine understands, the bookmaker odds
//! record keyed by those outcomes, and the model prediction consumed as
//! an opaque input from the statistical layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────
// Outcomes and markets
// ────────────────────────────────────────────

/// Market an outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketKind {
    /// Head-to-head 1X2 market.
    MatchResult,
    /// Over/under 2.5 goals.
    Totals,
    /// Double chance (1X, 12, X2). Outcomes overlap, so never an arbitrage set.
    DoubleChance,
}

impl MarketKind {
    /// Outcomes forming this market, in display order.
    pub fn outcomes(self) -> &'static [OutcomeKey] {
        match self {
            Self::MatchResult => &[OutcomeKey::HomeWin, OutcomeKey::Draw, OutcomeKey::AwayWin],
            Self::Totals => &[OutcomeKey::Over25, OutcomeKey::Under25],
            Self::DoubleChance => &[
                OutcomeKey::HomeOrDraw,
                OutcomeKey::HomeOrAway,
                OutcomeKey::DrawOrAway,
            ],
        }
    }

    /// Whether the outcomes are mutually exclusive and exhaustive.
    pub fn is_exclusive(self) -> bool {
        !matches!(self, Self::DoubleChance)
    }
}

impl std::fmt::Display for MarketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MatchResult => write!(f, "match_result"),
            Self::Totals => write!(f, "totals"),
            Self::DoubleChance => write!(f, "double_chance"),
        }
    }
}

/// Outcome key used in odds records and recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKey {
    HomeWin,
    Draw,
    AwayWin,
    #[serde(rename = "over_2_5")]
    Over25,
    #[serde(rename = "under_2_5")]
    Under25,
    HomeOrDraw,
    HomeOrAway,
    DrawOrAway,
}

impl OutcomeKey {
    /// Every supported outcome.
    pub const ALL: [Self; 8] = [
        Self::HomeWin,
        Self::Draw,
        Self::AwayWin,
        Self::Over25,
        Self::Under25,
        Self::HomeOrDraw,
        Self::HomeOrAway,
        Self::DrawOrAway,
    ];

    /// Market this outcome belongs to.
    pub fn market(self) -> MarketKind {
        match self {
            Self::HomeWin | Self::Draw | Self::AwayWin => MarketKind::MatchResult,
            Self::Over25 | Self::Under25 => MarketKind::Totals,
            Self::HomeOrDraw | Self::HomeOrAway | Self::DrawOrAway => MarketKind::DoubleChance,
        }
    }

    /// Human-readable label for alert titles.
    pub fn label(self) -> &'static str {
        match self {
            Self::HomeWin => "Home Win",
            Self::Draw => "Draw",
            Self::AwayWin => "Away Win",
            Self::Over25 => "Over 2.5",
            Self::Under25 => "Under 2.5",
            Self::HomeOrDraw => "Home or Draw",
            Self::HomeOrAway => "Home or Away",
            Self::DrawOrAway => "Draw or Away",
        }
    }
}

impl std::fmt::Display for OutcomeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = match self {
            Self::HomeWin => "home_win",
            Self::Draw => "draw",
            Self::AwayWin => "away_win",
            Self::Over25 => "over_2_5",
            Self::Under25 => "under_2_5",
            Self::HomeOrDraw => "home_or_draw",
            Self::HomeOrAway => "home_or_away",
            Self::DrawOrAway => "draw_or_away",
        };
        write!(f, "{key}")
    }
}

// ────────────────────────────────────────────
// Bookmaker odds
// ────────────────────────────────────────────

/// Decimal odds quoted by one bookmaker for one match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketOdds {
    /// Bookmaker quoting these prices, if known.
    #[serde(default)]
    pub bookmaker: Option<String>,
    /// Outcome → decimal odds.
    #[serde(default)]
    pub prices: BTreeMap<OutcomeKey, f64>,
}

impl MarketOdds {
    /// Empty odds record for a named bookmaker.
    pub fn new(bookmaker: impl Into<String>) -> Self {
        Self {
            bookmaker: Some(bookmaker.into()),
            prices: BTreeMap::new(),
        }
    }

    /// Builder-style price setter.
    #[must_use]
    pub fn with(mut self, outcome: OutcomeKey, odds: f64) -> Self {
        self.prices.insert(outcome, odds);
        self
    }

    /// Price for an outcome.
    pub fn get(&self, outcome: OutcomeKey) -> Option<f64> {
        self.prices.get(&outcome).copied()
    }

    /// Prices for every outcome of `market`, or `None` if any is missing
    /// or below 1.0.
    pub fn complete_market(&self, market: MarketKind) -> Option<Vec<f64>> {
        market
            .outcomes()
            .iter()
            .map(|o| self.get(*o).filter(|p| p.is_finite() && *p >= 1.0))
            .collect()
    }

    /// Bookmaker label, or `"unknown"`.
    pub fn bookmaker_label(&self) -> &str {
        self.bookmaker.as_deref().unwrap_or("unknown")
    }
}

// ────────────────────────────────────────────
// Model prediction
// ────────────────────────────────────────────

/// Outcome probabilities produced by the statistical model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
    /// Probability of three or more goals, when the model provides it.
    #[serde(default)]
    pub over_2_5: Option<f64>,
    pub expected_home_goals: f64,
    pub expected_away_goals: f64,
    /// Model confidence in `[0, 1]`.
    pub confidence: f64,
}

impl Prediction {
    /// Probability of more than 2.5 goals.
    ///
    /// Falls back to a Poisson model on total expected goals when the
    /// prediction carries no explicit value.
    pub fn over_2_5_probability(&self) -> f64 {
        if let Some(p) = self.over_2_5 {
            return p.clamp(0.0, 1.0);
        }
        let lambda = (self.expected_home_goals + self.expected_away_goals).max(0.0);
        let at_most_two = (-lambda).exp() * (1.0 + lambda + lambda * lambda / 2.0);
        (1.0 - at_most_two).clamp(0.0, 1.0)
    }

    /// Model probability for an outcome key.
    pub fn probability(&self, outcome: OutcomeKey) -> f64 {
        let p = match outcome {
            OutcomeKey::HomeWin => self.home_win,
            OutcomeKey::Draw => self.draw,
            OutcomeKey::AwayWin => self.away_win,
            OutcomeKey::Over25 => self.over_2_5_probability(),
            OutcomeKey::Under25 => 1.0 - self.over_2_5_probability(),
            OutcomeKey::HomeOrDraw => self.home_win + self.draw,
            OutcomeKey::HomeOrAway => self.home_win + self.away_win,
            OutcomeKey::DrawOrAway => self.draw + self.away_win,
        };
        if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 }
    }

    /// Sum of the 1X2 probabilities.
    pub fn match_result_total(&self) -> f64 {
        self.home_win + self.draw + self.away_win
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction() -> Prediction {
        Prediction {
            home_win: 0.45,
            draw: 0.27,
            away_win: 0.28,
            over_2_5: None,
            expected_home_goals: 1.5,
            expected_away_goals: 1.1,
            confidence: 0.8,
        }
    }

    #[test]
    fn test_outcome_serde_keys() {
        let json = serde_json::to_string(&OutcomeKey::Over25).unwrap();
        assert_eq!(json, "\"over_2_5\"");
        let key: OutcomeKey = serde_json::from_str("\"home_or_draw\"").unwrap();
        assert_eq!(key, OutcomeKey::HomeOrDraw);
        assert_eq!(OutcomeKey::Under25.to_string(), "under_2_5");
    }

    #[test]
    fn test_double_chance_probabilities() {
        let p = prediction();
        assert!((p.probability(OutcomeKey::HomeOrDraw) - 0.72).abs() < 1e-9);
        assert!((p.probability(OutcomeKey::DrawOrAway) - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_poisson_over_under() {
        let p = prediction();
        let over = p.probability(OutcomeKey::Over25);
        let under = p.probability(OutcomeKey::Under25);
        // lambda = 2.6 → P(over 2.5) ≈ 0.482
        assert!((over - 0.482).abs() < 0.01, "got {over}");
        assert!((over + under - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_over_probability_wins() {
        let mut p = prediction();
        p.over_2_5 = Some(0.61);
        assert!((p.probability(OutcomeKey::Over25) - 0.61).abs() < 1e-9);
    }

    #[test]
    fn test_complete_market() {
        let odds = MarketOdds::new("book")
            .with(OutcomeKey::HomeWin, 2.1)
            .with(OutcomeKey::Draw, 3.4);
        assert!(odds.complete_market(MarketKind::MatchResult).is_none());
        let odds = odds.with(OutcomeKey::AwayWin, 3.6);
        assert_eq!(odds.complete_market(MarketKind::MatchResult), Some(vec![2.1, 3.4, 3.6]));
    }

    #[test]
    fn test_market_odds_deserializes_keys() {
        let odds: MarketOdds = serde_json::from_str(
            r#"{"bookmaker":"pinnacle","prices":{"home_win":2.0,"over_2_5":1.9}}"#,
        )
        .unwrap();
        assert_eq!(odds.get(OutcomeKey::HomeWin), Some(2.0));
        assert_eq!(odds.get(OutcomeKey::Over25), Some(1.9));
        assert_eq!(odds.bookmaker_label(), "pinnacle");
    }
}
