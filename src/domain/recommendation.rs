//! Recommendation and analysis records produced by the builder.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::arbitrage::ArbitrageOpportunity;
use super::classify::{RiskLevel, ValueRating};
use super::market::{MarketKind, OutcomeKey};

/// Suggested stakes for one recommendation.
///
/// `kelly` and `kelly_fractional` are bankroll fractions in `[0, 1]`
/// with `kelly_fractional <= kelly`. Money amounts are in bankroll units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakePlan {
    /// Full Kelly fraction.
    pub kelly: f64,
    /// Fractional Kelly fraction.
    pub kelly_fractional: f64,
    /// Flat stake as a percent of bankroll.
    pub fixed_percentage: f64,
    /// Flat stake in money.
    pub fixed_amount: Decimal,
    /// Fractional Kelly stake in money.
    pub kelly_amount: Decimal,
}

/// A risk-rated recommendation for one outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetRecommendation {
    pub outcome: OutcomeKey,
    pub market: MarketKind,
    pub bookmaker: Option<String>,
    pub model_probability: f64,
    pub market_odds: f64,
    pub implied_probability: f64,
    /// Expected value in percent.
    pub expected_value: f64,
    pub value_rating: ValueRating,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub recommended_stake: StakePlan,
    pub is_value_bet: bool,
    pub is_strong_value: bool,
    pub is_arbitrage: bool,
}

impl BetRecommendation {
    /// Model edge over the market in probability points.
    pub fn edge(&self) -> f64 {
        self.model_probability - self.implied_probability
    }
}

/// Margin of one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketMargin {
    pub market: MarketKind,
    /// Overround in percent.
    pub margin: f64,
}

/// Per-market and overall bookmaker margin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarginAnalysis {
    pub markets: Vec<MarketMargin>,
    /// Mean margin of the complete markets (0 when none).
    pub overall: f64,
}

impl MarginAnalysis {
    /// Margin of a single market, if it was complete.
    pub fn market(&self, market: MarketKind) -> Option<f64> {
        self.markets.iter().find(|m| m.market == market).map(|m| m.margin)
    }
}

/// Staking strategy families the engine can advise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    FixedStake,
    KellyCriterion,
}

/// One staking strategy suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyAdvice {
    pub strategy: StrategyKind,
    pub description: String,
    pub recommended: bool,
}

/// Full output of one analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BettingAnalysis {
    pub recommendations: Vec<BetRecommendation>,
    /// Value bets only, EV-descending, at most five.
    pub top_recommendations: Vec<BetRecommendation>,
    pub margin_analysis: MarginAnalysis,
    pub arbitrage_opportunities: Vec<ArbitrageOpportunity>,
    /// 1 = perfectly fair prices, 0 = badly mispriced.
    pub market_efficiency: f64,
    /// Mean EV (percent) over all evaluated outcomes.
    pub overall_ev: f64,
    pub warnings: Vec<String>,
    pub strategy_advice: Vec<StrategyAdvice>,
}

impl BettingAnalysis {
    /// Value-flagged recommendations in evaluation order.
    pub fn value_bets(&self) -> impl Iterator<Item = &BetRecommendation> {
        self.recommendations.iter().filter(|r| r.is_value_bet)
    }

    /// Whether an arbitrage was found on any market.
    pub fn has_arbitrage(&self) -> bool {
        !self.arbitrage_opportunities.is_empty()
    }
}
