//! Kelly Criterion stake sizing.
//!
//! Full Kelly for decimal odds:
//!   f* = (b * p - q) / b
//! where:
//!   b = odds - 1 (net odds)
//!   p = model probability of winning
//!   q = 1 - p
//!
//! Full Kelly maximizes long-run log growth but swings hard, so the
//! recommendation layer reports a fractional (quarter by default) stake
//! alongside it.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

/// Full Kelly fraction of bankroll for a bet at decimal `odds`.
///
/// Clamped to `[0, 1]`: a negative edge stakes nothing. Degenerate input
/// (`p <= 0`, `p >= 1`, `odds <= 1`) yields 0.
///
/// # Examples
/// ```
/// use odds_sentinel::domain::kelly::calculate_kelly_criterion;
/// let f = calculate_kelly_criterion(0.30, 3.50);
/// assert!((f - 0.02).abs() < 1e-9);
/// ```
pub fn calculate_kelly_criterion(probability: f64, odds: f64) -> f64 {
    if !probability.is_finite() || !odds.is_finite() {
        return 0.0;
    }
    if probability <= 0.0 || probability >= 1.0 || odds <= 1.0 {
        return 0.0;
    }

    let b = odds - 1.0;
    let q = 1.0 - probability;
    let full = (b * probability - q) / b;

    full.clamp(0.0, 1.0)
}

/// Fractional Kelly: full Kelly scaled by `ratio` (clamped to `[0, 1]`).
///
/// Never exceeds the full-Kelly value for the same input.
pub fn fractional_kelly(probability: f64, odds: f64, ratio: f64) -> f64 {
    let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
    calculate_kelly_criterion(probability, odds) * ratio
}

/// Kelly stake sizer with a fixed fractional multiplier and per-bet cap.
#[derive(Debug, Clone)]
pub struct KellySizer {
    /// Kelly multiplier (0.25 = quarter-Kelly).
    fraction: f64,
    /// Maximum stake as a fraction of bankroll.
    max_stake_fraction: f64,
}

impl KellySizer {
    /// Create a sizer with the given Kelly multiplier and stake cap.
    pub fn new(fraction: f64, max_stake_fraction: f64) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0),
            max_stake_fraction: max_stake_fraction.clamp(0.0, 1.0),
        }
    }

    /// Kelly multiplier in use.
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Full Kelly fraction (uncapped by the multiplier).
    pub fn full(&self, probability: f64, odds: f64) -> f64 {
        calculate_kelly_criterion(probability, odds)
    }

    /// Fractional Kelly fraction, capped at `max_stake_fraction`.
    pub fn fractional(&self, probability: f64, odds: f64) -> f64 {
        fractional_kelly(probability, odds, self.fraction).min(self.max_stake_fraction)
    }

    /// Money stake for the fractional Kelly fraction, rounded to cents.
    pub fn stake_amount(&self, bankroll: Decimal, probability: f64, odds: f64) -> Decimal {
        if bankroll <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let fraction = Decimal::from_f64(self.fractional(probability, odds)).unwrap_or(Decimal::ZERO);
        (bankroll * fraction).round_dp(2)
    }
}

impl Default for KellySizer {
    /// Default: quarter-Kelly, at most 10% of bankroll on a single bet.
    fn default() -> Self {
        Self {
            fraction: 0.25,
            max_stake_fraction: 0.10,
        }
    }
}

/// Fixed-percentage stake of `bankroll`, rounded to cents.
pub fn fixed_percentage_stake(bankroll: Decimal, percent: f64) -> Decimal {
    if bankroll <= Decimal::ZERO || !percent.is_finite() || percent <= 0.0 {
        return Decimal::ZERO;
    }
    let pct = Decimal::from_f64(percent).unwrap_or(Decimal::ZERO);
    (bankroll * pct / dec!(100)).round_dp(2)
}
