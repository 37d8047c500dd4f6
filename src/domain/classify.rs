//! Qualitative value and risk ratings for a bet.

use serde::{Deserialize, Serialize};

/// Banded value rating derived from expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueRating {
    Negative,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl std::fmt::Display for ValueRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Negative => write!(f, "Negative"),
            Self::Poor => write!(f, "Poor"),
            Self::Fair => write!(f, "Fair"),
            Self::Good => write!(f, "Good"),
            Self::Excellent => write!(f, "Excellent"),
        }
    }
}

/// Risk tier of a bet. Ordered from safest to riskiest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    fn from_score(score: i32) -> Self {
        match score {
            i32::MIN..=0 => Self::Low,
            1 => Self::Medium,
            2 => Self::High,
            _ => Self::VeryHigh,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::VeryHigh => write!(f, "Very High"),
        }
    }
}

/// Classify an expected value (percent) into a value band.
pub fn value_bet_quality(ev: f64) -> ValueRating {
    if ev >= 10.0 {
        ValueRating::Excellent
    } else if ev >= 5.0 {
        ValueRating::Good
    } else if ev >= 2.0 {
        ValueRating::Fair
    } else if ev > 0.0 {
        ValueRating::Poor
    } else {
        ValueRating::Negative
    }
}

/// Composite risk tier from model confidence, odds size and edge sign.
///
/// A negative edge is always `VeryHigh`. Otherwise longer odds add risk
/// and higher confidence removes it:
///
/// | odds        | score |   | confidence   | adj |
/// |-------------|-------|---|--------------|-----|
/// | < 2.0       | 0     |   | ≥ 0.75       | -1  |
/// | < 3.5       | 1     |   | ≥ 0.60       | 0   |
/// | < 6.0       | 2     |   | otherwise    | +1  |
/// | otherwise   | 3     |   |              |     |
pub fn risk_level(confidence: f64, odds: f64, edge_signal: f64) -> RiskLevel {
    if edge_signal < 0.0 || !edge_signal.is_finite() {
        return RiskLevel::VeryHigh;
    }

    let odds_score = if odds < 2.0 {
        0
    } else if odds < 3.5 {
        1
    } else if odds < 6.0 {
        2
    } else {
        3
    };

    let confidence_adj = if confidence >= 0.75 {
        -1
    } else if confidence >= 0.6 {
        0
    } else {
        1
    };

    RiskLevel::from_score((odds_score + confidence_adj).clamp(0, 3))
}
