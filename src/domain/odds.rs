//! Odds math - decimal odds, implied probability, fair odds, EV, margin.
//!
//! Every function here is total: degenerate input (odds below 1.0,
//! probabilities at 0 or 1, empty books) maps to a defined fallback
//! value instead of an error, so the analysis pipeline never has to
//! branch on numeric failures.

/// Implied probability of decimal odds.
///
/// Odds strictly below 1.0 (or non-finite) are invalid and yield 0.
/// Odds of exactly 1.0 mean certainty and yield 1.
///
/// # Examples
/// ```
/// use odds_sentinel::domain::odds::implied_probability;
/// assert!((implied_probability(2.0) - 0.5).abs() < 1e-12);
/// assert_eq!(implied_probability(0.5), 0.0);
/// ```
pub fn implied_probability(odds: f64) -> f64 {
    if !odds.is_finite() || odds < 1.0 {
        return 0.0;
    }
    1.0 / odds
}

/// Fair (zero-margin) decimal odds for a probability.
///
/// Probabilities at or outside the `(0, 1)` bounds yield 1.0 rather than
/// infinite or sub-unit odds.
pub fn fair_odds(probability: f64) -> f64 {
    if !probability.is_finite() || probability <= 0.0 || probability >= 1.0 {
        return 1.0;
    }
    1.0 / probability
}

/// Expected value, in percent of the stake, of backing an outcome.
///
/// `(p * odds - 1) * 100`. Positive means the market underprices the
/// outcome relative to the model.
pub fn expected_value(model_probability: f64, market_odds: f64) -> f64 {
    (model_probability * market_odds - 1.0) * 100.0
}

/// Bookmaker margin (overround) of a complete outcome set, in percent.
///
/// Invalid odds contribute nothing; an empty book has no margin.
pub fn calculate_bookmaker_margin(odds: &[f64]) -> f64 {
    if odds.is_empty() {
        return 0.0;
    }
    let book: f64 = odds.iter().map(|o| implied_probability(*o)).sum();
    (book - 1.0) * 100.0
}

/// Margin-free probabilities for a complete outcome set.
///
/// Each implied probability is divided by the book total. Returns an
/// empty vector when no entry carries a valid price.
pub fn normalize_probabilities(odds: &[f64]) -> Vec<f64> {
    let implied: Vec<f64> = odds.iter().map(|o| implied_probability(*o)).collect();
    let total: f64 = implied.iter().sum();
    if total <= 0.0 {
        return Vec::new();
    }
    implied.into_iter().map(|p| p / total).collect()
}

/// Relative price change from `previous` to `current`, in percent.
///
/// Returns 0 when the previous price is not a valid decimal price.
pub fn odds_movement(previous: f64, current: f64) -> f64 {
    if !previous.is_finite() || previous < 1.0 || !current.is_finite() {
        return 0.0;
    }
    (current / previous - 1.0) * 100.0
}
