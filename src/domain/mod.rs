//! Domain layer - Core betting math and records.
//!
//! Pure logic for the betting decision engine: odds conversions, Kelly
//! sizing, arbitrage detection, value/risk classification, the bankroll
//! ledger and the alert records. No I/O here (hexagonal inner ring);
//! every type is serializable and testable in isolation.

pub mod alert;
pub mod arbitrage;
pub mod bankroll;
pub mod classify;
pub mod kelly;
pub mod market;
pub mod odds;
pub mod recommendation;

// Re-export core types for convenience
pub use alert::{Alert, AlertRule, AlertType, ChannelKind, RuleConditions, Severity};
pub use arbitrage::{ArbitrageCheck, ArbitrageOpportunity, detect_arbitrage};
pub use bankroll::{BankrollLedger, BankrollState, StreakType, initialize_bankroll, simulate_bet};
pub use classify::{RiskLevel, ValueRating, risk_level, value_bet_quality};
pub use kelly::{KellySizer, calculate_kelly_criterion, fractional_kelly};
pub use market::{MarketKind, MarketOdds, OutcomeKey, Prediction};
pub use odds::{calculate_bookmaker_margin, expected_value, fair_odds, implied_probability};
pub use recommendation::{
    BetRecommendation, BettingAnalysis, MarginAnalysis, StakePlan, StrategyAdvice, StrategyKind,
};
