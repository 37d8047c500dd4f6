//! Alert Rule Engine - Analysis and Market Events → Alerts
//!
//! Stateless matching of analysis output against configured rules:
//! - Strong value / value bets per recommendation
//! - Arbitrage per opportunity
//! - Market inefficiency when efficiency drops below threshold
//! - Odds movement, closing line value and bankroll threshold events
//!
//! Every alert type is gated by an enabled rule of that type. Types
//! without one are dropped silently.

use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::domain::alert::{Alert, AlertRule, AlertType, ChannelKind};
use crate::domain::arbitrage::ArbitrageOpportunity;
use crate::domain::bankroll::BankrollState;
use crate::domain::classify::RiskLevel;
use crate::domain::market::{MarketOdds, OutcomeKey};
use crate::domain::odds::odds_movement;
use crate::domain::recommendation::{BetRecommendation, BettingAnalysis};

/// An alert together with the channels its rule targets.
#[derive(Debug, Clone, PartialEq)]
pub struct RaisedAlert {
  pub alert: Alert,
  pub channels: Vec<ChannelKind>,
}

impl RaisedAlert {
  fn new(rule: &AlertRule, alert: Alert) -> Self {
    Self {
      alert,
      channels: rule.channels.clone(),
    }
  }
}

/// Rule engine over a fixed rule set.
#[derive(Debug, Clone)]
pub struct AlertRuleEngine {
  /// Rules in configuration order.
  rules: Vec<AlertRule>,
  /// Market efficiency below which an inefficiency alert is raised.
  inefficiency_threshold: f64,
}

impl AlertRuleEngine {
  /// Create an engine from rules and the inefficiency threshold.
  pub fn new(rules: Vec<AlertRule>, inefficiency_threshold: f64) -> Self {
    Self {
      rules,
      inefficiency_threshold,
    }
  }

  /// Configured rules.
  pub fn rules(&self) -> &[AlertRule] {
    &self.rules
  }

  /// First enabled rule of the given type.
  fn rule(&self, alert_type: AlertType) -> Option<&AlertRule> {
    self
      .rules
      .iter()
      .find(|r| r.enabled && r.alert_type == alert_type)
  }

  /// Alerts raised by one analysis, in raise order.
  pub fn evaluate(&self, analysis: &BettingAnalysis) -> Vec<RaisedAlert> {
    self.evaluate_inner(None, analysis)
  }

  /// Same as `evaluate`, with the match label in titles and payloads.
  pub fn evaluate_match(&self, match_label: &str, analysis: &BettingAnalysis) -> Vec<RaisedAlert> {
    self.evaluate_inner(Some(match_label), analysis)
  }

  fn evaluate_inner(&self, label: Option<&str>, analysis: &BettingAnalysis) -> Vec<RaisedAlert> {
    let mut raised = Vec::new();

    for rec in analysis.value_bets() {
      let alert_type = if rec.is_strong_value {
        AlertType::StrongValueBet
      } else {
        AlertType::ValueBet
      };
      let Some(rule) = self.rule(alert_type) else {
        continue;
      };
      if !rule.accepts(rec.expected_value, rec.confidence, rec.risk_level) {
        continue;
      }
      raised.push(RaisedAlert::new(rule, value_alert(rule, label, rec)));
    }

    if let Some(rule) = self.rule(AlertType::Arbitrage) {
      for opportunity in &analysis.arbitrage_opportunities {
        if rule.accepts(opportunity.profit_pct, 1.0, RiskLevel::Low) {
          raised.push(RaisedAlert::new(rule, arbitrage_alert(rule, label, opportunity)));
        }
      }
    }

    let inefficient = analysis.market_efficiency < self.inefficiency_threshold;
    if let Some(rule) = self.rule(AlertType::MarketInefficiency).filter(|_| inefficient) {
      let title = titled(label, "Market inefficiency detected");
      let message = format!(
        "Market efficiency {:.0}% with {:.1}% average margin",
        analysis.market_efficiency * 100.0,
        analysis.margin_analysis.overall
      );
      let data = json!({
        "match": label,
        "market_efficiency": analysis.market_efficiency,
        "margin_analysis": payload(&analysis.margin_analysis),
      });
      raised.push(RaisedAlert::new(
        rule,
        Alert::new(AlertType::MarketInefficiency, rule.priority, title, message, data),
      ));
    }

    debug!(
      raised = raised.len(),
      value_bets = analysis.value_bets().count(),
      "Rules evaluated"
    );

    raised
  }

  /// Odds movement alerts between two snapshots of the same bookmaker.
  ///
  /// Outcomes quoted in only one snapshot are skipped.
  pub fn evaluate_odds_movement(
    &self,
    match_label: &str,
    previous: &MarketOdds,
    current: &MarketOdds,
  ) -> Vec<RaisedAlert> {
    let Some(rule) = self.rule(AlertType::OddsMovement) else {
      return Vec::new();
    };
    let min_move = rule.conditions.min_odds_movement.unwrap_or(0.0);

    current
      .prices
      .iter()
      .filter_map(|(outcome, now)| {
        let before = previous.get(*outcome)?;
        let moved = odds_movement(before, *now);
        if moved == 0.0 || moved.abs() < min_move {
          return None;
        }

        let direction = if moved > 0.0 { "drifted" } else { "shortened" };
        let title = format!("{match_label}: {} odds {direction} {:+.1}%", outcome.label(), moved);
        let message = format!(
          "{} moved from {before:.2} to {now:.2} at {}",
          outcome.label(),
          current.bookmaker_label()
        );
        let data = json!({
          "match": match_label,
          "outcome": outcome,
          "bookmaker": current.bookmaker,
          "previous_odds": before,
          "current_odds": now,
          "movement_pct": moved,
        });
        Some(RaisedAlert::new(
          rule,
          Alert::new(AlertType::OddsMovement, rule.priority, title, message, data),
        ))
      })
      .collect()
  }

  /// Closing line value alert for a price taken before kick-off.
  ///
  /// CLV = (taken / closing - 1) * 100.
  pub fn evaluate_closing_line(
    &self,
    match_label: &str,
    outcome: OutcomeKey,
    taken: f64,
    closing: f64,
  ) -> Option<RaisedAlert> {
    let rule = self.rule(AlertType::ClosingLineValue)?;
    if !(taken.is_finite() && closing.is_finite()) || closing <= 1.0 || taken <= 1.0 {
      return None;
    }

    let clv = closing_line_value(taken, closing);
    if clv < rule.conditions.min_clv.unwrap_or(0.0) {
      return None;
    }

    let title = format!("{match_label}: {} beat the close by {clv:.1}%", outcome.label());
    let message = format!("Taken at {taken:.2}, closed at {closing:.2}");
    let data = json!({
      "match": match_label,
      "outcome": outcome,
      "taken_odds": taken,
      "closing_odds": closing,
      "clv_pct": clv,
    });
    Some(RaisedAlert::new(
      rule,
      Alert::new(AlertType::ClosingLineValue, rule.priority, title, message, data),
    ))
  }

  /// Bankroll threshold alert when the balance falls below the rule's floor.
  pub fn evaluate_bankroll(&self, state: &BankrollState) -> Option<RaisedAlert> {
    let rule = self.rule(AlertType::BankrollThreshold)?;
    let threshold = rule.conditions.bankroll_threshold?;
    let current = state.current_bankroll.to_f64().unwrap_or(0.0);
    if current >= threshold {
      return None;
    }

    let title = "Bankroll below threshold".to_string();
    let message = format!(
      "Bankroll {current:.2} is below {threshold:.2} ({:.1}% drawdown from peak)",
      state.drawdown()
    );
    let data = json!({
      "threshold": threshold,
      "bankroll": payload(state),
    });
    Some(RaisedAlert::new(
      rule,
      Alert::new(AlertType::BankrollThreshold, rule.priority, title, message, data),
    ))
  }
}

/// Closing line value in percent.
pub fn closing_line_value(taken: f64, closing: f64) -> f64 {
  if closing <= 0.0 {
    return 0.0;
  }
  (taken / closing - 1.0) * 100.0
}

fn value_alert(rule: &AlertRule, label: Option<&str>, rec: &BetRecommendation) -> Alert {
  let heading = if rec.is_strong_value {
    "Strong value"
  } else {
    "Value bet"
  };
  let title = titled(
    label,
    &format!("{heading}: {} @ {:.2}", rec.outcome.label(), rec.market_odds),
  );
  let message = format!(
    "{:.1}% EV at {:.0}% confidence, {} risk ({})",
    rec.expected_value,
    rec.confidence * 100.0,
    rec.risk_level,
    rec.bookmaker.as_deref().unwrap_or("unknown bookmaker")
  );
  let data = json!({
    "match": label,
    "recommendation": payload(rec),
  });
  Alert::new(rule.alert_type, rule.priority, title, message, data)
}

fn arbitrage_alert(rule: &AlertRule, label: Option<&str>, opportunity: &ArbitrageOpportunity) -> Alert {
  let title = titled(
    label,
    &format!(
      "Arbitrage: {:.2}% guaranteed on {}",
      opportunity.profit_pct, opportunity.market
    ),
  );
  let legs: Vec<String> = opportunity
    .legs
    .iter()
    .map(|leg| {
      format!(
        "{} @ {:.2} ({}, {:.1}%)",
        leg.outcome.label(),
        leg.odds,
        leg.bookmaker,
        leg.stake * 100.0
      )
    })
    .collect();
  let message = format!("Stake split: {}", legs.join("; "));
  let data = json!({
    "match": label,
    "opportunity": payload(opportunity),
  });
  Alert::new(AlertType::Arbitrage, rule.priority, title, message, data)
}

fn titled(label: Option<&str>, title: &str) -> String {
  match label {
    Some(label) => format!("{label}: {title}"),
    None => title.to_string(),
  }
}

fn payload<T: Serialize>(value: &T) -> Value {
  serde_json::to_value(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::alert::{RuleConditions, Severity};
  use crate::domain::bankroll::{initialize_bankroll, settle_bet};
  use crate::domain::market::Prediction;
  use crate::usecases::recommendation_builder::analyze_betting_opportunities;
  use rust_decimal_macros::dec;

  fn value_analysis() -> BettingAnalysis {
    let prediction = Prediction {
      home_win: 0.55,
      draw: 0.25,
      away_win: 0.20,
      over_2_5: Some(0.5),
      expected_home_goals: 1.6,
      expected_away_goals: 1.0,
      confidence: 0.85,
    };
    let odds = MarketOdds::new("book")
      .with(OutcomeKey::HomeWin, 2.40)
      .with(OutcomeKey::Draw, 3.40)
      .with(OutcomeKey::AwayWin, 3.10);
    analyze_betting_opportunities(&prediction, &odds, 1000.0)
  }

  #[test]
  fn test_strong_value_raised_once() {
    let engine = AlertRuleEngine::new(AlertRule::default_rules(), 0.7);
    let analysis = value_analysis();
    let raised = engine.evaluate(&analysis);

    let strong: Vec<_> = raised
      .iter()
      .filter(|r| r.alert.alert_type == AlertType::StrongValueBet)
      .collect();
    assert_eq!(strong.len(), 1);
    assert_eq!(strong[0].alert.severity, Severity::High);
    assert!(strong[0].alert.title.contains("Home Win"));
    assert!(!raised.iter().any(|r| r.alert.alert_type == AlertType::ValueBet
      && r.alert.title.contains("Home Win")));
  }

  #[test]
  fn test_missing_rule_drops_silently() {
    let engine = AlertRuleEngine::new(Vec::new(), 0.7);
    assert!(engine.evaluate(&value_analysis()).is_empty());
  }

  #[test]
  fn test_disabled_rule_ignored() {
    let mut rule = AlertRule::new(AlertType::StrongValueBet, Severity::High, vec![ChannelKind::Console]);
    rule.enabled = false;
    let engine = AlertRuleEngine::new(vec![rule], 1.0);
    assert!(engine.evaluate(&value_analysis()).is_empty());
  }

  #[test]
  fn test_arbitrage_and_inefficiency() {
    let prediction = Prediction {
      home_win: 0.34,
      draw: 0.33,
      away_win: 0.33,
      over_2_5: None,
      expected_home_goals: 1.3,
      expected_away_goals: 1.3,
      confidence: 0.8,
    };
    let odds = MarketOdds::new("book")
      .with(OutcomeKey::HomeWin, 3.00)
      .with(OutcomeKey::Draw, 3.00)
      .with(OutcomeKey::AwayWin, 3.50);
    let mut analysis = analyze_betting_opportunities(&prediction, &odds, 1000.0);
    analysis.market_efficiency = 0.5;

    let engine = AlertRuleEngine::new(AlertRule::default_rules(), 0.7);
    let raised = engine.evaluate_match("A vs B", &analysis);

    let arb = raised
      .iter()
      .find(|r| r.alert.alert_type == AlertType::Arbitrage)
      .unwrap();
    assert_eq!(arb.alert.severity, Severity::Critical);
    assert!(arb.channels.contains(&ChannelKind::Email));
    assert!(arb.alert.title.starts_with("A vs B: "));
    assert_eq!(arb.alert.data["match"], "A vs B");
    assert!(raised.iter().any(|r| r.alert.alert_type == AlertType::MarketInefficiency));
  }

  #[test]
  fn test_odds_movement_threshold() {
    let engine = AlertRuleEngine::new(AlertRule::default_rules(), 0.7);
    let before = MarketOdds::new("book")
      .with(OutcomeKey::HomeWin, 2.00)
      .with(OutcomeKey::Draw, 3.40);
    let after = MarketOdds::new("book")
      .with(OutcomeKey::HomeWin, 2.30)
      .with(OutcomeKey::Draw, 3.50)
      .with(OutcomeKey::AwayWin, 3.00);

    let raised = engine.evaluate_odds_movement("A vs B", &before, &after);
    assert_eq!(raised.len(), 1);
    assert!(raised[0].alert.title.contains("Home Win"));
    assert!((raised[0].alert.data["movement_pct"].as_f64().unwrap() - 15.0).abs() < 1e-9);
  }

  #[test]
  fn test_closing_line_value() {
    let engine = AlertRuleEngine::new(AlertRule::default_rules(), 0.7);
    assert!((closing_line_value(2.20, 2.00) - 10.0).abs() < 1e-9);

    let beat = engine.evaluate_closing_line("A vs B", OutcomeKey::Draw, 2.20, 2.00);
    assert!(beat.is_some());
    let missed = engine.evaluate_closing_line("A vs B", OutcomeKey::Draw, 2.00, 2.20);
    assert!(missed.is_none());
    assert!(engine.evaluate_closing_line("A vs B", OutcomeKey::Draw, 2.0, 0.0).is_none());
  }

  #[test]
  fn test_bankroll_threshold() {
    let rule = AlertRule::new(AlertType::BankrollThreshold, Severity::High, vec![ChannelKind::Console])
      .with_conditions(RuleConditions {
        bankroll_threshold: Some(900.0),
        ..RuleConditions::default()
      });
    let engine = AlertRuleEngine::new(vec![rule], 0.7);

    let start = initialize_bankroll(dec!(1000));
    assert!(engine.evaluate_bankroll(&start).is_none());

    let after_loss = settle_bet(&start, dec!(150), 2.0, false);
    let raised = engine.evaluate_bankroll(&after_loss).unwrap();
    assert_eq!(raised.alert.alert_type, AlertType::BankrollThreshold);
    assert!(raised.alert.message.contains("850.00"));
  }
}
