//! Alert Rate Limiter - Sliding One-Hour Window
//!
//! Caps how many alerts the dispatcher accepts per rolling hour.
//! Timestamps older than the window are pruned on every attempt;
//! rejected attempts are not recorded.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Sliding-window limiter keyed by alert timestamps.
#[derive(Debug, Clone)]
pub struct AlertRateLimiter {
  /// Maximum accepted alerts inside one window.
  max_per_window: usize,
  /// Window length.
  window: Duration,
  /// Accepted timestamps in acceptance order. Not necessarily sorted:
  /// alerts may carry out-of-order stamps.
  accepted: VecDeque<DateTime<Utc>>,
}

impl AlertRateLimiter {
  /// Limiter allowing `max_per_hour` alerts per rolling hour.
  pub fn per_hour(max_per_hour: usize) -> Self {
    Self::new(max_per_hour, Duration::hours(1))
  }

  /// Limiter with an arbitrary window.
  pub fn new(max_per_window: usize, window: Duration) -> Self {
    Self {
      max_per_window,
      window,
      accepted: VecDeque::with_capacity(max_per_window),
    }
  }

  /// Record an attempt at `now`. Returns false when the window is full.
  pub fn try_acquire(&mut self, now: DateTime<Utc>) -> bool {
    self.prune(now);

    if self.accepted.len() >= self.max_per_window {
      debug!(
        in_window = self.accepted.len(),
        limit = self.max_per_window,
        "Alert rate limit reached"
      );
      return false;
    }

    self.accepted.push_back(now);
    true
  }

  /// Slots left in the window at `now`.
  pub fn remaining(&mut self, now: DateTime<Utc>) -> usize {
    self.prune(now);
    self.max_per_window.saturating_sub(self.accepted.len())
  }

  /// Configured cap.
  pub fn limit(&self) -> usize {
    self.max_per_window
  }

  fn prune(&mut self, now: DateTime<Utc>) {
    let cutoff = now - self.window;
    self.accepted.retain(|t| *t > cutoff);
  }
}

impl Default for AlertRateLimiter {
  fn default() -> Self {
    Self::per_hour(20)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_caps_within_window() {
    let mut limiter = AlertRateLimiter::per_hour(3);
    let t0 = Utc::now();

    assert!(limiter.try_acquire(t0));
    assert!(limiter.try_acquire(t0 + Duration::minutes(1)));
    assert!(limiter.try_acquire(t0 + Duration::minutes(2)));
    assert!(!limiter.try_acquire(t0 + Duration::minutes(3)));
    assert_eq!(limiter.remaining(t0 + Duration::minutes(3)), 0);
  }

  #[test]
  fn test_window_slides() {
    let mut limiter = AlertRateLimiter::per_hour(2);
    let t0 = Utc::now();

    assert!(limiter.try_acquire(t0));
    assert!(limiter.try_acquire(t0 + Duration::minutes(30)));
    assert!(!limiter.try_acquire(t0 + Duration::minutes(59)));
    // First entry expires one hour after it was accepted
    assert!(limiter.try_acquire(t0 + Duration::minutes(60)));
    assert!(!limiter.try_acquire(t0 + Duration::minutes(61)));
    assert!(limiter.try_acquire(t0 + Duration::minutes(91)));
  }

  #[test]
  fn test_rejections_not_recorded() {
    let mut limiter = AlertRateLimiter::per_hour(1);
    let t0 = Utc::now();

    assert!(limiter.try_acquire(t0));
    for i in 1..10 {
      assert!(!limiter.try_acquire(t0 + Duration::minutes(i)));
    }
    assert!(limiter.try_acquire(t0 + Duration::minutes(60)));
  }

  #[test]
  fn test_out_of_order_stamp_does_not_pin_window() {
    let mut limiter = AlertRateLimiter::per_hour(20);
    let t0 = Utc::now();

    assert!(limiter.try_acquire(t0 + Duration::hours(10)));
    for _ in 0..19 {
      assert!(limiter.try_acquire(t0));
    }
    assert!(!limiter.try_acquire(t0 + Duration::minutes(1)));

    // The t0 entries have expired; only the future stamp is still held
    assert!(limiter.try_acquire(t0 + Duration::hours(2)));
    assert_eq!(limiter.remaining(t0 + Duration::hours(2)), 18);
  }

  #[test]
  fn test_default_limit() {
    assert_eq!(AlertRateLimiter::default().limit(), 20);
  }
}
