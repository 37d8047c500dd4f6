//! Arbitrage detection over a complete, mutually exclusive outcome set.
//!
//! With book sum S = Σ 1/odds_i below 1, staking each outcome in
//! proportion to (1/odds_i)/S returns 1/S per unit staked whatever the
//! result, a guaranteed profit of (1/S - 1) * 100 percent.
//!
//! Works for any number of outcomes. Cross-bookmaker scans take the best
//! price per outcome first and run the detector on that line.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use super::market::{MarketKind, MarketOdds, OutcomeKey};
use super::odds::implied_probability;

/// Result of checking one odds line for arbitrage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageCheck {
    pub is_arbitrage: bool,
    /// Sum of implied probabilities of the line.
    pub implied_sum: f64,
    /// Per-outcome stake proportions (sum to 1). Empty when no arbitrage.
    pub stakes: Vec<f64>,
    /// Guaranteed profit in percent of total stake. 0 when no arbitrage.
    pub profit_pct: f64,
}

impl ArbitrageCheck {
    fn none(implied_sum: f64) -> Self {
        Self {
            is_arbitrage: false,
            implied_sum,
            stakes: Vec::new(),
            profit_pct: 0.0,
        }
    }
}

/// Check a complete outcome set for a risk-free opportunity.
///
/// Requires at least two valid (≥ 1.0) prices; any invalid entry voids
/// the check, since an incomplete set cannot be covered.
pub fn detect_arbitrage(odds: &[f64]) -> ArbitrageCheck {
    if odds.len() < 2 || odds.iter().any(|o| !o.is_finite() || *o < 1.0) {
        return ArbitrageCheck::none(0.0);
    }

    let implied: Vec<f64> = odds.iter().map(|o| implied_probability(*o)).collect();
    let sum: f64 = implied.iter().sum();

    if sum >= 1.0 || sum <= 0.0 {
        return ArbitrageCheck::none(sum);
    }

    let mut stakes: Vec<f64> = implied.iter().map(|p| p / sum).collect();
    // Absorb float residue in the last leg so the stakes sum to exactly 1.
    let residue = 1.0 - stakes.iter().sum::<f64>();
    if let Some(last) = stakes.last_mut() {
        *last += residue;
    }

    ArbitrageCheck {
        is_arbitrage: true,
        implied_sum: sum,
        stakes,
        profit_pct: (1.0 / sum - 1.0) * 100.0,
    }
}

/// One leg of an arbitrage: where to place what share of the stake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageLeg {
    pub outcome: OutcomeKey,
    pub bookmaker: String,
    pub odds: f64,
    /// Share of the total stake (legs sum to 1).
    pub stake: f64,
}

/// A detected risk-free opportunity across one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageOpportunity {
    pub market: MarketKind,
    pub legs: Vec<ArbitrageLeg>,
    pub implied_sum: f64,
    pub profit_pct: f64,
}

impl ArbitrageOpportunity {
    /// Outcomes covered by the opportunity.
    pub fn outcomes(&self) -> Vec<OutcomeKey> {
        self.legs.iter().map(|l| l.outcome).collect()
    }

    /// Distinct bookmakers involved, in leg order.
    pub fn bookmakers(&self) -> Vec<String> {
        let mut books: Vec<String> = Vec::new();
        for leg in &self.legs {
            if !books.contains(&leg.bookmaker) {
                books.push(leg.bookmaker.clone());
            }
        }
        books
    }

    /// Split a total money stake across the legs, rounded to cents.
    pub fn allocate_stakes(&self, total: Decimal) -> Vec<(OutcomeKey, Decimal)> {
        self.legs
            .iter()
            .map(|leg| {
                let share = Decimal::from_f64(leg.stake).unwrap_or(Decimal::ZERO);
                (leg.outcome, (total * share).round_dp(2))
            })
            .collect()
    }

    /// Guaranteed money return on `total` staked.
    pub fn guaranteed_profit(&self, total: Decimal) -> Decimal {
        let pct = Decimal::from_f64(self.profit_pct).unwrap_or(Decimal::ZERO);
        (total * pct / Decimal::ONE_HUNDRED).round_dp(2)
    }
}

/// Best price per outcome across several bookmakers.
///
/// Returns `(odds, bookmaker)` per outcome, or `None` if any outcome has
/// no valid price anywhere.
pub fn best_prices(books: &[MarketOdds], outcomes: &[OutcomeKey]) -> Option<Vec<(f64, String)>> {
    outcomes
        .iter()
        .map(|outcome| {
            books
                .iter()
                .filter_map(|book| {
                    book.get(*outcome)
                        .filter(|p| p.is_finite() && *p >= 1.0)
                        .map(|p| (p, book.bookmaker_label().to_string()))
                })
                .max_by(|a, b| a.0.total_cmp(&b.0))
        })
        .collect()
}

/// Scan a market across bookmakers for an arbitrage on the best line.
///
/// Overlapping markets (double chance) are never scanned.
pub fn scan_market(books: &[MarketOdds], market: MarketKind) -> Option<ArbitrageOpportunity> {
    if !market.is_exclusive() {
        return None;
    }
    let outcomes = market.outcomes();
    let line = best_prices(books, outcomes)?;
    let prices: Vec<f64> = line.iter().map(|(p, _)| *p).collect();

    let check = detect_arbitrage(&prices);
    if !check.is_arbitrage {
        return None;
    }

    let legs = outcomes
        .iter()
        .zip(line)
        .zip(check.stakes)
        .map(|((outcome, (odds, bookmaker)), stake)| ArbitrageLeg {
            outcome: *outcome,
            bookmaker,
            odds,
            stake,
        })
        .collect();

    Some(ArbitrageOpportunity {
        market,
        legs,
        implied_sum: check.implied_sum,
        profit_pct: check.profit_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_detects_three_way_arbitrage() {
        let check = detect_arbitrage(&[3.00, 3.00, 3.50]);
        assert!(check.is_arbitrage);
        let total: f64 = check.stakes.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(check.profit_pct > 0.0);
    }

    #[test]
    fn test_profit_is_uniform_across_outcomes() {
        let odds = [3.00, 3.00, 3.50];
        let check = detect_arbitrage(&odds);
        let returns: Vec<f64> = odds.iter().zip(&check.stakes).map(|(o, s)| o * s).collect();
        for r in &returns {
            assert!((r - returns[0]).abs() < 1e-9);
            assert!(((r - 1.0) * 100.0 - check.profit_pct).abs() < 1e-9);
        }
    }

    #[test]
    fn test_no_arbitrage_on_normal_book() {
        let check = detect_arbitrage(&[3.50, 3.20, 2.10]);
        assert!(!check.is_arbitrage);
        assert_eq!(check.profit_pct, 0.0);
        assert!(check.stakes.is_empty());
    }

    #[test]
    fn test_two_way_and_degenerate() {
        assert!(detect_arbitrage(&[2.10, 2.05]).is_arbitrage);
        assert!(!detect_arbitrage(&[2.0, 2.0]).is_arbitrage);
        assert!(!detect_arbitrage(&[5.0]).is_arbitrage);
        assert!(!detect_arbitrage(&[3.0, 0.5, 3.0]).is_arbitrage);
    }

    #[test]
    fn test_cross_book_scan() {
        let a = MarketOdds::new("alpha")
            .with(OutcomeKey::HomeWin, 2.90)
            .with(OutcomeKey::Draw, 3.10)
            .with(OutcomeKey::AwayWin, 2.60);
        let b = MarketOdds::new("beta")
            .with(OutcomeKey::HomeWin, 3.20)
            .with(OutcomeKey::Draw, 3.60)
            .with(OutcomeKey::AwayWin, 3.40);

        let opp = scan_market(&[a, b], MarketKind::MatchResult).expect("arbitrage");
        assert_eq!(opp.legs.len(), 3);
        assert_eq!(opp.bookmakers(), vec!["beta".to_string()]);
        assert!(opp.profit_pct > 0.0);
        assert!(scan_market(&[], MarketKind::MatchResult).is_none());
        assert!(scan_market(&[], MarketKind::DoubleChance).is_none());
    }

    #[test]
    fn test_allocate_stakes() {
        let check = detect_arbitrage(&[2.10, 2.10]);
        let opp = ArbitrageOpportunity {
            market: MarketKind::Totals,
            legs: vec![
                ArbitrageLeg { outcome: OutcomeKey::Over25, bookmaker: "a".into(), odds: 2.10, stake: check.stakes[0] },
                ArbitrageLeg { outcome: OutcomeKey::Under25, bookmaker: "b".into(), odds: 2.10, stake: check.stakes[1] },
            ],
            implied_sum: check.implied_sum,
            profit_pct: check.profit_pct,
        };
        let stakes = opp.allocate_stakes(dec!(100));
        assert_eq!(stakes[0].1, dec!(50.00));
        assert_eq!(stakes[1].1, dec!(50.00));
        assert_eq!(opp.guaranteed_profit(dec!(100)), dec!(5.00));
    }
}
