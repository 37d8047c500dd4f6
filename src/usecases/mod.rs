//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the engine's core workflows. Each use case is a self-contained
//! business operation.
//!
//! Use cases:
//! - `RecommendationBuilder`: Prediction + odds → ranked analysis
//! - `AlertRuleEngine`: Analysis and market events → alerts
//! - `AlertDispatcher`: Rate-limited store and channel fan-out
//! - `OddsMonitor`: Periodic poll loop

pub mod alert_dispatcher;
pub mod alert_rules;
pub mod monitor;
pub mod rate_limiter;
pub mod recommendation_builder;

pub use alert_dispatcher::{AlertDispatcher, DeliveryHandles, DeliveryReport, DispatchOutcome};
pub use alert_rules::{AlertRuleEngine, RaisedAlert};
pub use monitor::{CycleSummary, OddsMonitor};
pub use rate_limiter::AlertRateLimiter;
pub use recommendation_builder::{RecommendationBuilder, analyze_betting_opportunities};
