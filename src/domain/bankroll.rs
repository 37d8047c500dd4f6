//! Bankroll ledger - bet-by-bet bankroll simulation.
//!
//! The ledger is purely functional: every settlement takes a state
//! snapshot and returns a new one, so independent simulations never
//! share mutable state. Randomness is injected through `rand::Rng` so
//! tests can seed it (or force outcomes with probability 0 or 1).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::recommendation::BetRecommendation;

/// Kind of the running streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakType {
    Win,
    Loss,
}

/// Snapshot of a bankroll after a sequence of settled bets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankrollState {
    pub current_bankroll: Decimal,
    pub starting_bankroll: Decimal,
    pub peak_bankroll: Decimal,
    pub lowest_bankroll: Decimal,
    pub total_bets: u64,
    pub won_bets: u64,
    pub lost_bets: u64,
    pub total_staked: Decimal,
    pub net_profit: Decimal,
    /// Net profit over total staked, in percent.
    pub roi: Decimal,
    pub current_streak: u32,
    pub streak_type: Option<StreakType>,
    pub longest_win_streak: u32,
    pub longest_loss_streak: u32,
    /// Deepest peak-to-trough fall seen, in percent of the peak.
    pub max_drawdown: Decimal,
}

impl BankrollState {
    /// Win rate in percent (0 before any bet).
    pub fn win_rate(&self) -> f64 {
        if self.total_bets == 0 {
            return 0.0;
        }
        self.won_bets as f64 / self.total_bets as f64 * 100.0
    }

    /// Current fall from peak, in percent of the peak.
    pub fn drawdown(&self) -> Decimal {
        if self.peak_bankroll <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        ((self.peak_bankroll - self.current_bankroll) / self.peak_bankroll * Decimal::ONE_HUNDRED)
            .round_dp(4)
    }
}

/// Fresh ledger state with every counter at zero.
pub fn initialize_bankroll(amount: Decimal) -> BankrollState {
    BankrollState {
        current_bankroll: amount,
        starting_bankroll: amount,
        peak_bankroll: amount,
        lowest_bankroll: amount,
        total_bets: 0,
        won_bets: 0,
        lost_bets: 0,
        total_staked: Decimal::ZERO,
        net_profit: Decimal::ZERO,
        roi: Decimal::ZERO,
        current_streak: 0,
        streak_type: None,
        longest_win_streak: 0,
        longest_loss_streak: 0,
        max_drawdown: Decimal::ZERO,
    }
}

/// Settle one bet with a known result.
///
/// The stake is clamped to `[0, current bankroll]`; a non-positive
/// effective stake leaves the state unchanged. A settlement whose
/// amounts exceed `Decimal` range is rejected and the state returned
/// unchanged.
pub fn settle_bet(state: &BankrollState, stake: Decimal, odds: f64, won: bool) -> BankrollState {
    let stake = stake.min(state.current_bankroll.max(Decimal::ZERO));
    if stake <= Decimal::ZERO {
        return state.clone();
    }

    let odds = Decimal::from_f64(odds).unwrap_or(Decimal::ONE).max(Decimal::ONE);

    match apply_settlement(state, stake, odds, won) {
        Some(next) => next,
        None => {
            warn!(
                stake = %stake,
                odds = %odds,
                won,
                "Settlement overflows decimal range, bet not recorded"
            );
            state.clone()
        }
    }
}

fn apply_settlement(
    state: &BankrollState,
    stake: Decimal,
    odds: Decimal,
    won: bool,
) -> Option<BankrollState> {
    let pnl = if won {
        stake.checked_mul(odds - Decimal::ONE)?.round_dp(2)
    } else {
        -stake
    };

    let mut next = state.clone();
    next.current_bankroll = next.current_bankroll.checked_add(pnl)?;
    next.total_staked = next.total_staked.checked_add(stake)?;
    next.net_profit = next.net_profit.checked_add(pnl)?;
    next.total_bets += 1;

    let kind = if won { StreakType::Win } else { StreakType::Loss };
    if next.streak_type == Some(kind) {
        next.current_streak += 1;
    } else {
        next.streak_type = Some(kind);
        next.current_streak = 1;
    }

    match kind {
        StreakType::Win => {
            next.won_bets += 1;
            next.longest_win_streak = next.longest_win_streak.max(next.current_streak);
        }
        StreakType::Loss => {
            next.lost_bets += 1;
            next.longest_loss_streak = next.longest_loss_streak.max(next.current_streak);
        }
    }

    next.peak_bankroll = next.peak_bankroll.max(next.current_bankroll);
    next.lowest_bankroll = next.lowest_bankroll.min(next.current_bankroll);
    next.max_drawdown = next.max_drawdown.max(next.drawdown());
    next.roi = next
        .net_profit
        .checked_div(next.total_staked)?
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp(4);

    Some(next)
}

/// Draw a win/loss for `win_probability` from `rng`.
///
/// Probabilities at or beyond the bounds are deterministic and consume
/// no randomness.
pub fn draw_outcome<R: Rng + ?Sized>(win_probability: f64, rng: &mut R) -> bool {
    if !win_probability.is_finite() || win_probability <= 0.0 {
        return false;
    }
    if win_probability >= 1.0 {
        return true;
    }
    rng.gen_range(0.0..1.0) < win_probability
}

/// Simulate one bet on a recommendation, drawing the result from `rng`.
pub fn simulate_bet<R: Rng + ?Sized>(
    recommendation: &BetRecommendation,
    stake: Decimal,
    state: &BankrollState,
    rng: &mut R,
) -> BankrollState {
    let won = draw_outcome(recommendation.model_probability, rng);
    debug!(
        outcome = %recommendation.outcome,
        odds = recommendation.market_odds,
        stake = %stake,
        won,
        "Simulated bet"
    );
    settle_bet(state, stake, recommendation.market_odds, won)
}

/// Seeded simulation driver owning its random source.
#[derive(Debug, Clone)]
pub struct BankrollLedger<R: Rng = StdRng> {
    rng: R,
}

impl BankrollLedger<StdRng> {
    /// Reproducible ledger for tests and backtests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Ledger seeded from OS entropy for production use.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl<R: Rng> BankrollLedger<R> {
    /// Wrap an arbitrary random source.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Simulate a single bet.
    pub fn simulate(
        &mut self,
        recommendation: &BetRecommendation,
        stake: Decimal,
        state: &BankrollState,
    ) -> BankrollState {
        simulate_bet(recommendation, stake, state, &mut self.rng)
    }

    /// Simulate a sequence of bets, returning every intermediate state
    /// (the starting state first).
    pub fn simulate_series(
        &mut self,
        bets: &[(BetRecommendation, Decimal)],
        start: &BankrollState,
    ) -> Vec<BankrollState> {
        let mut history = Vec::with_capacity(bets.len() + 1);
        history.push(start.clone());
        for (recommendation, stake) in bets {
            let last = history.last().cloned().unwrap_or_else(|| start.clone());
            history.push(self.simulate(recommendation, *stake, &last));
        }
        history
    }
}
