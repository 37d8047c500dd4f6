//! Recommendation Builder - Prediction + Odds → Ranked Recommendations
//!
//! For every outcome quoted in the odds record:
//! 1. Implied probability and expected value
//! 2. Full and fractional Kelly, flat stake suggestions
//! 3. Value/risk classification and value flags
//!
//! Then aggregates margins, market efficiency, arbitrage, warnings and
//! staking advice into a `BettingAnalysis`.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::domain::arbitrage::{ArbitrageOpportunity, best_prices, scan_market};
use crate::domain::classify::{risk_level, value_bet_quality};
use crate::domain::kelly::{KellySizer, fixed_percentage_stake};
use crate::domain::market::{MarketKind, MarketOdds, OutcomeKey, Prediction};
use crate::domain::odds::{calculate_bookmaker_margin, expected_value, implied_probability};
use crate::domain::recommendation::{
  BetRecommendation, BettingAnalysis, MarginAnalysis, MarketMargin, StakePlan, StrategyAdvice,
  StrategyKind,
};

/// Markets scanned for arbitrage and margin.
const EXCLUSIVE_MARKETS: [MarketKind; 2] = [MarketKind::MatchResult, MarketKind::Totals];

/// Tolerance on the 1X2 probability sum before a warning is raised.
const PROBABILITY_SUM_TOLERANCE: f64 = 0.05;

/// One quoted price on the line being analyzed.
#[derive(Debug, Clone)]
struct Quote {
  outcome: OutcomeKey,
  odds: f64,
  bookmaker: Option<String>,
}

/// Builds `BettingAnalysis` records from predictions and odds.
#[derive(Debug, Clone)]
pub struct RecommendationBuilder {
  /// Thresholds and stake settings.
  config: AnalysisConfig,
  /// Kelly sizer built from the config.
  sizer: KellySizer,
}

impl RecommendationBuilder {
  /// Create a builder from analysis config.
  pub fn new(config: &AnalysisConfig) -> Self {
    Self {
      sizer: KellySizer::new(config.kelly_fraction, config.max_stake_fraction),
      config: config.clone(),
    }
  }

  /// Thresholds in use.
  pub fn config(&self) -> &AnalysisConfig {
    &self.config
  }

  /// Analyze one bookmaker's odds for a match.
  pub fn analyze(
    &self,
    prediction: &Prediction,
    odds: &MarketOdds,
    bankroll: f64,
  ) -> BettingAnalysis {
    let quotes = odds
      .prices
      .iter()
      .map(|(outcome, price)| Quote {
        outcome: *outcome,
        odds: *price,
        bookmaker: odds.bookmaker.clone(),
      })
      .collect();

    let arbitrage = EXCLUSIVE_MARKETS
      .iter()
      .filter_map(|market| scan_market(std::slice::from_ref(odds), *market))
      .collect();

    self.analyze_line(prediction, quotes, arbitrage, bankroll)
  }

  /// Analyze the best available line across several bookmakers.
  ///
  /// Each outcome is priced at its best quote; arbitrage is scanned
  /// across books so legs may sit with different bookmakers.
  pub fn analyze_books(
    &self,
    prediction: &Prediction,
    books: &[MarketOdds],
    bankroll: f64,
  ) -> BettingAnalysis {
    let quotes = OutcomeKey::ALL
      .iter()
      .filter_map(|outcome| {
        best_prices(books, std::slice::from_ref(outcome))
          .and_then(|mut best| best.pop())
          .map(|(odds, bookmaker)| Quote {
            outcome: *outcome,
            odds,
            bookmaker: Some(bookmaker),
          })
      })
      .collect();

    let arbitrage = EXCLUSIVE_MARKETS
      .iter()
      .filter_map(|market| scan_market(books, *market))
      .collect();

    self.analyze_line(prediction, quotes, arbitrage, bankroll)
  }

  fn analyze_line(
    &self,
    prediction: &Prediction,
    quotes: Vec<Quote>,
    arbitrage_opportunities: Vec<ArbitrageOpportunity>,
    bankroll: f64,
  ) -> BettingAnalysis {
    let bankroll = Decimal::from_f64(bankroll)
      .unwrap_or(Decimal::ZERO)
      .max(Decimal::ZERO);

    let recommendations: Vec<BetRecommendation> = quotes
      .into_iter()
      .filter(|q| q.odds.is_finite() && q.odds >= 1.0)
      .map(|q| {
        let is_arbitrage = arbitrage_opportunities
          .iter()
          .any(|a| a.market == q.outcome.market());
        self.recommend(prediction, q, bankroll, is_arbitrage)
      })
      .collect();

    let margin_analysis = margin_analysis(&recommendations);
    let market_efficiency = (1.0
      - margin_analysis.overall.abs() / self.config.efficiency_margin_scale)
      .clamp(0.0, 1.0);

    let mut top_recommendations: Vec<BetRecommendation> = recommendations
      .iter()
      .filter(|r| r.is_value_bet)
      .cloned()
      .collect();
    top_recommendations.sort_by(|a, b| b.expected_value.total_cmp(&a.expected_value));
    top_recommendations.truncate(self.config.max_top_recommendations);

    let overall_ev = if recommendations.is_empty() {
      0.0
    } else {
      recommendations.iter().map(|r| r.expected_value).sum::<f64>() / recommendations.len() as f64
    };

    let warnings = self.warnings(prediction, &recommendations, &margin_analysis);
    let strategy_advice = self.strategy_advice(prediction, &recommendations);

    debug!(
      outcomes = recommendations.len(),
      value_bets = top_recommendations.len(),
      arbitrage = arbitrage_opportunities.len(),
      margin = margin_analysis.overall,
      overall_ev,
      "Analysis complete"
    );

    BettingAnalysis {
      recommendations,
      top_recommendations,
      margin_analysis,
      arbitrage_opportunities,
      market_efficiency,
      overall_ev,
      warnings,
      strategy_advice,
    }
  }

  /// Build the recommendation for one quoted outcome.
  fn recommend(
    &self,
    prediction: &Prediction,
    quote: Quote,
    bankroll: Decimal,
    is_arbitrage: bool,
  ) -> BetRecommendation {
    let probability = prediction.probability(quote.outcome);
    let confidence = prediction.confidence.clamp(0.0, 1.0);
    let ev = expected_value(probability, quote.odds);

    let is_value_bet = ev >= self.config.min_value_ev;
    let is_strong_value = is_value_bet
      && ev >= self.config.strong_value_ev
      && confidence >= self.config.strong_value_confidence;

    let fixed_percentage = if is_value_bet {
      self.config.fixed_stake_pct
    } else {
      0.0
    };

    let recommended_stake = StakePlan {
      kelly: self.sizer.full(probability, quote.odds),
      kelly_fractional: self.sizer.fractional(probability, quote.odds),
      fixed_percentage,
      fixed_amount: fixed_percentage_stake(bankroll, fixed_percentage),
      kelly_amount: self.sizer.stake_amount(bankroll, probability, quote.odds),
    };

    BetRecommendation {
      outcome: quote.outcome,
      market: quote.outcome.market(),
      bookmaker: quote.bookmaker,
      model_probability: probability,
      market_odds: quote.odds,
      implied_probability: implied_probability(quote.odds),
      expected_value: ev,
      value_rating: value_bet_quality(ev),
      risk_level: risk_level(confidence, quote.odds, ev),
      confidence,
      recommended_stake,
      is_value_bet,
      is_strong_value,
      is_arbitrage,
    }
  }

  fn warnings(
    &self,
    prediction: &Prediction,
    recommendations: &[BetRecommendation],
    margins: &MarginAnalysis,
  ) -> Vec<String> {
    let mut warnings = Vec::new();

    if margins.overall > self.config.high_margin_threshold {
      warnings.push(format!(
        "High bookmaker margin of {:.1}% reduces long-run value",
        margins.overall
      ));
    }

    if !recommendations.iter().any(|r| r.is_value_bet) {
      warnings.push("No value bets found at current prices".to_string());
    }

    if prediction.confidence < self.config.min_confidence {
      warnings.push(format!(
        "Low model confidence ({:.0}%): treat recommendations with caution",
        prediction.confidence * 100.0
      ));
    }

    let total = prediction.match_result_total();
    if (total - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
      warnings.push(format!(
        "Match result probabilities sum to {total:.3} instead of 1.0"
      ));
    }

    warnings
  }

  fn strategy_advice(
    &self,
    prediction: &Prediction,
    recommendations: &[BetRecommendation],
  ) -> Vec<StrategyAdvice> {
    let mut advice = vec![StrategyAdvice {
      strategy: StrategyKind::FixedStake,
      description: format!(
        "Stake a flat {:.1}% of bankroll on every value bet",
        self.config.fixed_stake_pct
      ),
      recommended: true,
    }];

    let best_edge = recommendations
      .iter()
      .filter(|r| {
        r.expected_value >= self.config.kelly_advice_min_ev && r.recommended_stake.kelly > 0.0
      })
      .map(|r| r.expected_value)
      .max_by(f64::total_cmp);

    if let Some(best_ev) = best_edge {
      advice.push(StrategyAdvice {
        strategy: StrategyKind::KellyCriterion,
        description: format!(
          "Size stakes at {:.0}% Kelly; strongest edge is {:.1}% EV",
          self.config.kelly_fraction * 100.0,
          best_ev
        ),
        recommended: prediction.confidence >= self.config.strong_value_confidence,
      });
    }

    advice
  }
}

impl Default for RecommendationBuilder {
  fn default() -> Self {
    Self::new(&AnalysisConfig::default())
  }
}

/// Analyze a single odds record with default thresholds.
pub fn analyze_betting_opportunities(
  prediction: &Prediction,
  odds: &MarketOdds,
  bankroll: f64,
) -> BettingAnalysis {
  RecommendationBuilder::default().analyze(prediction, odds, bankroll)
}

/// Margin of every complete exclusive market on the analyzed line.
fn margin_analysis(recommendations: &[BetRecommendation]) -> MarginAnalysis {
  let markets: Vec<MarketMargin> = EXCLUSIVE_MARKETS
    .iter()
    .filter_map(|market| {
      let prices: Option<Vec<f64>> = market
        .outcomes()
        .iter()
        .map(|outcome| {
          recommendations
            .iter()
            .find(|r| r.outcome == *outcome)
            .map(|r| r.market_odds)
        })
        .collect();
      prices.map(|p| MarketMargin {
        market: *market,
        margin: calculate_bookmaker_margin(&p),
      })
    })
    .collect();

  let overall = if markets.is_empty() {
    0.0
  } else {
    markets.iter().map(|m| m.margin).sum::<f64>() / markets.len() as f64
  };

  MarginAnalysis { markets, overall }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn prediction(home: f64, draw: f64, away: f64, confidence: f64) -> Prediction {
    Prediction {
      home_win: home,
      draw,
      away_win: away,
      over_2_5: Some(0.5),
      expected_home_goals: 1.4,
      expected_away_goals: 1.2,
      confidence,
    }
  }

  fn full_book() -> MarketOdds {
    MarketOdds::new("book")
      .with(OutcomeKey::HomeWin, 2.40)
      .with(OutcomeKey::Draw, 3.40)
      .with(OutcomeKey::AwayWin, 3.10)
      .with(OutcomeKey::Over25, 1.95)
      .with(OutcomeKey::Under25, 1.90)
      .with(OutcomeKey::HomeOrDraw, 1.40)
      .with(OutcomeKey::HomeOrAway, 1.35)
      .with(OutcomeKey::DrawOrAway, 1.60)
  }

  #[test]
  fn test_fair_market_has_small_ev() {
    let p = prediction(0.40, 0.30, 0.30, 0.8);
    let odds = MarketOdds::new("fair")
      .with(OutcomeKey::HomeWin, 2.5)
      .with(OutcomeKey::Draw, 1.0 / 0.3)
      .with(OutcomeKey::AwayWin, 1.0 / 0.3)
      .with(OutcomeKey::Over25, 2.0)
      .with(OutcomeKey::Under25, 2.0);

    let analysis = analyze_betting_opportunities(&p, &odds, 1000.0);
    assert!(analysis.overall_ev.abs() < 5.0);
    assert!(analysis.margin_analysis.overall.abs() < 1e-6);
    assert!((analysis.market_efficiency - 1.0).abs() < 1e-6);
  }

  #[test]
  fn test_low_confidence_warning() {
    let p = prediction(0.45, 0.28, 0.27, 0.5);
    let analysis = analyze_betting_opportunities(&p, &full_book(), 1000.0);
    assert!(analysis.warnings.iter().any(|w| w.to_lowercase().contains("confidence")));
  }

  #[test]
  fn test_top_recommendations_sorted_value_only() {
    let p = prediction(0.55, 0.25, 0.20, 0.85);
    let analysis = analyze_betting_opportunities(&p, &full_book(), 1000.0);

    assert!(!analysis.top_recommendations.is_empty());
    assert!(analysis.top_recommendations.len() <= 5);
    assert!(analysis.top_recommendations.iter().all(|r| r.is_value_bet));
    for pair in analysis.top_recommendations.windows(2) {
      assert!(pair[0].expected_value >= pair[1].expected_value);
    }
  }

  #[test]
  fn test_high_ev_needs_confidence_to_be_strong() {
    let odds = MarketOdds::new("book").with(OutcomeKey::HomeWin, 2.40);

    // 0.55 at 2.40 is +32% EV, well above the strong EV bar
    let unsure = analyze_betting_opportunities(&prediction(0.55, 0.25, 0.20, 0.69), &odds, 1000.0);
    let home = &unsure.recommendations[0];
    assert!(home.expected_value >= 10.0);
    assert!(home.is_value_bet);
    assert!(!home.is_strong_value);

    let sure = analyze_betting_opportunities(&prediction(0.55, 0.25, 0.20, 0.70), &odds, 1000.0);
    assert!(sure.recommendations[0].is_strong_value);
  }

  #[test]
  fn test_stake_plan_invariants() {
    let p = prediction(0.55, 0.25, 0.20, 0.85);
    let analysis = analyze_betting_opportunities(&p, &full_book(), 1000.0);
    for r in &analysis.recommendations {
      let s = &r.recommended_stake;
      assert!(s.kelly_fractional <= s.kelly);
      assert!((0.0..=1.0).contains(&s.kelly));
      assert!((0.0..=1.0).contains(&s.kelly_fractional));
      if r.is_value_bet {
        assert_eq!(s.fixed_amount, Decimal::from(20));
      } else {
        assert_eq!(s.fixed_amount, Decimal::ZERO);
      }
    }
  }

  #[test]
  fn test_includes_double_chance_and_totals() {
    let p = prediction(0.45, 0.28, 0.27, 0.8);
    let analysis = analyze_betting_opportunities(&p, &full_book(), 1000.0);
    assert_eq!(analysis.recommendations.len(), 8);
    let dc = analysis
      .recommendations
      .iter()
      .find(|r| r.outcome == OutcomeKey::HomeOrDraw)
      .unwrap();
    assert!((dc.model_probability - 0.73).abs() < 1e-9);
    assert!(analysis.margin_analysis.market(MarketKind::MatchResult).is_some());
    assert!(analysis.margin_analysis.market(MarketKind::Totals).is_some());
    assert!(analysis.margin_analysis.market(MarketKind::DoubleChance).is_none());
  }

  #[test]
  fn test_arbitrage_flags_market() {
    let p = prediction(0.34, 0.33, 0.33, 0.8);
    let odds = MarketOdds::new("book")
      .with(OutcomeKey::HomeWin, 3.00)
      .with(OutcomeKey::Draw, 3.00)
      .with(OutcomeKey::AwayWin, 3.50);

    let analysis = analyze_betting_opportunities(&p, &odds, 1000.0);
    assert_eq!(analysis.arbitrage_opportunities.len(), 1);
    assert!(analysis.recommendations.iter().all(|r| r.is_arbitrage));
    assert!(analysis.margin_analysis.overall < 0.0);
  }

  #[test]
  fn test_strategy_advice() {
    let value = analyze_betting_opportunities(&prediction(0.55, 0.25, 0.20, 0.85), &full_book(), 1000.0);
    assert_eq!(value.strategy_advice[0].strategy, StrategyKind::FixedStake);
    assert!(value.strategy_advice[0].recommended);
    assert!(value.strategy_advice.iter().any(|a| a.strategy == StrategyKind::KellyCriterion));

    let fair = MarketOdds::new("fair")
      .with(OutcomeKey::HomeWin, 2.0)
      .with(OutcomeKey::Draw, 4.0)
      .with(OutcomeKey::AwayWin, 4.0);
    let none = analyze_betting_opportunities(&prediction(0.5, 0.25, 0.25, 0.85), &fair, 1000.0);
    assert_eq!(none.strategy_advice.len(), 1);
    assert!(none.warnings.iter().any(|w| w.contains("No value bets")));
  }

  #[test]
  fn test_high_margin_lowers_efficiency() {
    let p = prediction(0.45, 0.28, 0.27, 0.8);
    let odds = MarketOdds::new("greedy")
      .with(OutcomeKey::HomeWin, 1.90)
      .with(OutcomeKey::Draw, 3.00)
      .with(OutcomeKey::AwayWin, 2.80);
    let analysis = analyze_betting_opportunities(&p, &odds, 1000.0);
    assert!(analysis.margin_analysis.overall > 8.0);
    assert!(analysis.market_efficiency < 0.7);
    assert!(analysis.warnings.iter().any(|w| w.contains("margin")));
  }

  #[test]
  fn test_invalid_odds_skipped() {
    let p = prediction(0.45, 0.28, 0.27, 0.8);
    let odds = MarketOdds::new("bad")
      .with(OutcomeKey::HomeWin, 0.5)
      .with(OutcomeKey::Draw, 3.4);
    let analysis = analyze_betting_opportunities(&p, &odds, 1000.0);
    assert_eq!(analysis.recommendations.len(), 1);
    assert!(analysis.margin_analysis.markets.is_empty());
  }

  #[test]
  fn test_analyze_books_uses_best_price() {
    let p = prediction(0.45, 0.28, 0.27, 0.8);
    let a = MarketOdds::new("alpha").with(OutcomeKey::HomeWin, 2.30).with(OutcomeKey::Draw, 3.60);
    let b = MarketOdds::new("beta").with(OutcomeKey::HomeWin, 2.50).with(OutcomeKey::Draw, 3.20);

    let analysis = RecommendationBuilder::default().analyze_books(&p, &[a, b], 1000.0);
    let home = analysis.recommendations.iter().find(|r| r.outcome == OutcomeKey::HomeWin).unwrap();
    let draw = analysis.recommendations.iter().find(|r| r.outcome == OutcomeKey::Draw).unwrap();
    assert_eq!(home.bookmaker.as_deref(), Some("beta"));
    assert!((home.market_odds - 2.50).abs() < 1e-12);
    assert_eq!(draw.bookmaker.as_deref(), Some("alpha"));
  }
}
