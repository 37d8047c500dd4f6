//! Alert Dispatcher - Rate-Limited Multi-Channel Fan-out
//!
//! Caller-owned alert pipeline:
//! 1. Rate-limit check (sliding one-hour window)
//! 2. Insertion-ordered in-memory store with bounded capacity
//! 3. Broadcast to registered listeners
//! 4. Fire-and-forget delivery to the rule's channels
//!
//! Delivery failures are logged and reported, never propagated.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AlertsConfig;
use crate::domain::alert::{Alert, ChannelKind};
use crate::ports::channel::AlertChannel;

use super::alert_rules::RaisedAlert;
use super::rate_limiter::AlertRateLimiter;

/// Listener channel capacity. Slow listeners lag rather than block.
const LISTENER_CAPACITY: usize = 256;

/// Result of delivering one alert through one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
  pub channel: ChannelKind,
  pub alert_id: Uuid,
  pub success: bool,
  pub error: Option<String>,
}

/// In-flight deliveries of one alert.
#[derive(Debug, Default)]
pub struct DeliveryHandles {
  handles: Vec<(ChannelKind, Uuid, JoinHandle<DeliveryReport>)>,
}

impl DeliveryHandles {
  /// Number of spawned deliveries.
  pub fn len(&self) -> usize {
    self.handles.len()
  }

  pub fn is_empty(&self) -> bool {
    self.handles.is_empty()
  }

  /// Wait for every delivery. Dropping the handles instead detaches them.
  pub async fn join(self) -> Vec<DeliveryReport> {
    let (meta, handles): (Vec<_>, Vec<_>) = self
      .handles
      .into_iter()
      .map(|(channel, alert_id, handle)| ((channel, alert_id), handle))
      .unzip();

    join_all(handles)
      .await
      .into_iter()
      .zip(meta)
      .map(|(result, (channel, alert_id))| {
        result.unwrap_or_else(|e| DeliveryReport {
          channel,
          alert_id,
          success: false,
          error: Some(format!("delivery task failed: {e}")),
        })
      })
      .collect()
  }
}

/// Outcome of a dispatch attempt.
#[derive(Debug)]
pub enum DispatchOutcome {
  /// Stored, broadcast and handed to the channels.
  Accepted {
    alert_id: Uuid,
    deliveries: DeliveryHandles,
  },
  /// Dropped by the rate limiter.
  RateLimited,
}

impl DispatchOutcome {
  pub fn is_accepted(&self) -> bool {
    matches!(self, Self::Accepted { .. })
  }
}

/// Alert dispatcher owning the store, limiter, listeners and channels.
pub struct AlertDispatcher {
  /// Alerts in insertion order, oldest first.
  store: Vec<Alert>,
  /// Store capacity; the oldest alert is evicted beyond it.
  max_stored: usize,
  /// Rolling-hour limiter.
  limiter: AlertRateLimiter,
  /// Listener broadcast.
  listeners: broadcast::Sender<Alert>,
  /// Registered channel adapters.
  channels: HashMap<ChannelKind, Arc<dyn AlertChannel>>,
}

impl AlertDispatcher {
  /// Create a dispatcher from alert config, with no channels registered.
  pub fn new(config: &AlertsConfig) -> Self {
    Self::with_limits(config.max_per_hour, config.max_stored)
  }

  /// Create a dispatcher with explicit limits.
  pub fn with_limits(max_per_hour: usize, max_stored: usize) -> Self {
    let (listeners, _) = broadcast::channel(LISTENER_CAPACITY);
    Self {
      store: Vec::new(),
      max_stored: max_stored.max(1),
      limiter: AlertRateLimiter::per_hour(max_per_hour),
      listeners,
      channels: HashMap::new(),
    }
  }

  /// Register a channel adapter, replacing any previous one of that kind.
  pub fn register_channel(&mut self, channel: Arc<dyn AlertChannel>) {
    let kind = channel.kind();
    if self.channels.insert(kind, channel).is_some() {
      debug!(channel = %kind, "Replaced channel adapter");
    }
  }

  /// Builder-style `register_channel`.
  #[must_use]
  pub fn with_channel(mut self, channel: Arc<dyn AlertChannel>) -> Self {
    self.register_channel(channel);
    self
  }

  /// Channel kinds with a registered adapter.
  pub fn registered_channels(&self) -> Vec<ChannelKind> {
    let mut kinds: Vec<ChannelKind> = self.channels.keys().copied().collect();
    kinds.sort();
    kinds
  }

  /// Subscribe to accepted alerts, in dispatch order.
  pub fn subscribe(&self) -> broadcast::Receiver<Alert> {
    self.listeners.subscribe()
  }

  /// Dispatch one raised alert.
  pub fn dispatch(&mut self, raised: RaisedAlert) -> DispatchOutcome {
    let RaisedAlert { alert, channels } = raised;

    if !self.limiter.try_acquire(alert.timestamp) {
      warn!(
        alert_id = %alert.id,
        alert_type = %alert.alert_type,
        limit = self.limiter.limit(),
        "Alert rate limit reached, dropping alert"
      );
      return DispatchOutcome::RateLimited;
    }

    let alert_id = alert.id;
    self.store.push(alert.clone());
    if self.store.len() > self.max_stored {
      let excess = self.store.len() - self.max_stored;
      self.store.drain(..excess);
    }

    // Err only means nobody is listening
    let _ = self.listeners.send(alert.clone());

    let deliveries = self.fan_out(&alert, &channels);

    info!(
      alert_id = %alert_id,
      alert_type = %alert.alert_type,
      severity = %alert.severity,
      channels = deliveries.len(),
      title = %alert.title,
      "Alert dispatched"
    );

    DispatchOutcome::Accepted {
      alert_id,
      deliveries,
    }
  }

  /// Dispatch alerts in raise order.
  pub fn dispatch_all(&mut self, raised: Vec<RaisedAlert>) -> Vec<DispatchOutcome> {
    raised.into_iter().map(|r| self.dispatch(r)).collect()
  }

  fn fan_out(&self, alert: &Alert, targets: &[ChannelKind]) -> DeliveryHandles {
    let mut deliveries = DeliveryHandles::default();
    if targets.is_empty() {
      return deliveries;
    }

    let Ok(runtime) = Handle::try_current() else {
      warn!(
        alert_id = %alert.id,
        "No async runtime available, skipping channel delivery"
      );
      return deliveries;
    };

    let mut seen = Vec::with_capacity(targets.len());
    for kind in targets {
      if seen.contains(kind) {
        continue;
      }
      seen.push(*kind);

      let Some(channel) = self.channels.get(kind) else {
        debug!(channel = %kind, alert_id = %alert.id, "No adapter registered for channel");
        continue;
      };

      let channel = Arc::clone(channel);
      let payload = alert.clone();
      let handle = runtime.spawn(async move { deliver(channel, payload).await });
      deliveries.handles.push((*kind, alert.id, handle));
    }

    deliveries
  }

  // ── Store operations ──

  /// Every stored alert, oldest first.
  pub fn alerts(&self) -> &[Alert] {
    &self.store
  }

  /// Stored alerts not yet read.
  pub fn unread(&self) -> Vec<&Alert> {
    self.store.iter().filter(|a| !a.read).collect()
  }

  /// Stored alerts already read.
  pub fn read(&self) -> Vec<&Alert> {
    self.store.iter().filter(|a| a.read).collect()
  }

  /// Stored alerts not dismissed.
  pub fn active(&self) -> Vec<&Alert> {
    self.store.iter().filter(|a| !a.dismissed).collect()
  }

  /// Mark one alert as read. Returns false if it is not stored.
  pub fn mark_as_read(&mut self, id: Uuid) -> bool {
    self.update(id, |a| a.read = true)
  }

  pub fn mark_all_as_read(&mut self) {
    for alert in &mut self.store {
      alert.read = true;
    }
  }

  /// Dismiss one alert. Returns false if it is not stored.
  pub fn dismiss(&mut self, id: Uuid) -> bool {
    self.update(id, |a| a.dismissed = true)
  }

  /// Drop every stored alert. The rate-limit window is kept.
  pub fn clear_all(&mut self) {
    self.store.clear();
  }

  fn update(&mut self, id: Uuid, apply: impl FnOnce(&mut Alert)) -> bool {
    match self.store.iter_mut().find(|a| a.id == id) {
      Some(alert) => {
        apply(alert);
        true
      }
      None => false,
    }
  }
}

/// Deliver one alert and turn the result into a report.
async fn deliver(channel: Arc<dyn AlertChannel>, alert: Alert) -> DeliveryReport {
  let kind = channel.kind();
  match channel.send(&alert).await {
    Ok(()) => {
      debug!(channel = %kind, alert_id = %alert.id, "Alert delivered");
      DeliveryReport {
        channel: kind,
        alert_id: alert.id,
        success: true,
        error: None,
      }
    }
    Err(e) => {
      warn!(
        channel = %kind,
        alert_id = %alert.id,
        error = %e,
        "Alert delivery failed"
      );
      DeliveryReport {
        channel: kind,
        alert_id: alert.id,
        success: false,
        error: Some(e.to_string()),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::alert::{AlertType, Severity};
  use crate::ports::channel::ChannelError;
  use async_trait::async_trait;
  use chrono::{Duration, Utc};
  use std::sync::Mutex;

  struct Recording {
    kind: ChannelKind,
    fail: bool,
    seen: Mutex<Vec<Uuid>>,
  }

  impl Recording {
    fn new(kind: ChannelKind, fail: bool) -> Arc<Self> {
      Arc::new(Self {
        kind,
        fail,
        seen: Mutex::new(Vec::new()),
      })
    }
  }

  #[async_trait]
  impl AlertChannel for Recording {
    fn kind(&self) -> ChannelKind {
      self.kind
    }

    async fn send(&self, alert: &Alert) -> Result<(), ChannelError> {
      self.seen.lock().unwrap().push(alert.id);
      if self.fail {
        Err(ChannelError::Unavailable("offline".into()))
      } else {
        Ok(())
      }
    }
  }

  fn raised(title: &str, channels: Vec<ChannelKind>) -> RaisedAlert {
    RaisedAlert {
      alert: Alert::new(
        AlertType::ValueBet,
        Severity::Medium,
        title,
        "message",
        serde_json::Value::Null,
      ),
      channels,
    }
  }

  #[test]
  fn test_rate_limit_twenty_per_hour() {
    let mut dispatcher = AlertDispatcher::with_limits(20, 100);
    let t0 = Utc::now();

    for i in 0..20 {
      let mut r = raised("a", vec![]);
      r.alert = r.alert.at(t0 + Duration::seconds(i));
      assert!(dispatcher.dispatch(r).is_accepted());
    }
    let mut over = raised("over", vec![]);
    over.alert = over.alert.at(t0 + Duration::minutes(5));
    assert!(matches!(dispatcher.dispatch(over), DispatchOutcome::RateLimited));
    assert_eq!(dispatcher.alerts().len(), 20);

    let mut later = raised("later", vec![]);
    later.alert = later.alert.at(t0 + Duration::minutes(61));
    assert!(dispatcher.dispatch(later).is_accepted());
  }

  #[test]
  fn test_replayed_alert_does_not_block_dispatch() {
    let mut dispatcher = AlertDispatcher::with_limits(20, 100);
    let t0 = Utc::now();

    let mut ahead = raised("ahead", vec![]);
    ahead.alert = ahead.alert.at(t0 + Duration::hours(10));
    assert!(dispatcher.dispatch(ahead).is_accepted());
    for _ in 0..19 {
      let mut r = raised("now", vec![]);
      r.alert = r.alert.at(t0);
      assert!(dispatcher.dispatch(r).is_accepted());
    }

    let mut later = raised("later", vec![]);
    later.alert = later.alert.at(t0 + Duration::hours(2));
    assert!(dispatcher.dispatch(later).is_accepted());
  }

  #[test]
  fn test_store_evicts_oldest() {
    let mut dispatcher = AlertDispatcher::with_limits(100, 3);
    for i in 0..5 {
      dispatcher.dispatch(raised(&format!("alert {i}"), vec![]));
    }
    let titles: Vec<&str> = dispatcher.alerts().iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["alert 2", "alert 3", "alert 4"]);
  }

  #[test]
  fn test_read_dismiss_clear() {
    let mut dispatcher = AlertDispatcher::with_limits(20, 100);
    dispatcher.dispatch(raised("one", vec![]));
    dispatcher.dispatch(raised("two", vec![]));
    let first = dispatcher.alerts()[0].id;

    assert!(dispatcher.mark_as_read(first));
    assert!(!dispatcher.mark_as_read(Uuid::new_v4()));
    assert_eq!(dispatcher.unread().len(), 1);
    assert_eq!(dispatcher.read().len(), 1);

    assert!(dispatcher.dismiss(first));
    assert_eq!(dispatcher.active().len(), 1);

    dispatcher.mark_all_as_read();
    assert!(dispatcher.unread().is_empty());

    dispatcher.clear_all();
    assert!(dispatcher.alerts().is_empty());
  }

  #[test]
  fn test_no_runtime_skips_delivery() {
    let channel = Recording::new(ChannelKind::Console, false);
    let mut dispatcher =
      AlertDispatcher::with_limits(20, 100).with_channel(channel.clone());

    match dispatcher.dispatch(raised("x", vec![ChannelKind::Console])) {
      DispatchOutcome::Accepted { deliveries, .. } => assert!(deliveries.is_empty()),
      DispatchOutcome::RateLimited => panic!("unexpected rate limit"),
    }
    assert_eq!(dispatcher.alerts().len(), 1);
    assert!(channel.seen.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_fan_out_reports_each_channel() {
    let ok = Recording::new(ChannelKind::Console, false);
    let bad = Recording::new(ChannelKind::Webhook, true);
    let mut dispatcher = AlertDispatcher::with_limits(20, 100)
      .with_channel(ok.clone())
      .with_channel(bad.clone());

    let outcome = dispatcher.dispatch(raised(
      "x",
      vec![ChannelKind::Console, ChannelKind::Webhook, ChannelKind::Email],
    ));
    let DispatchOutcome::Accepted { alert_id, deliveries } = outcome else {
      panic!("expected acceptance");
    };
    assert_eq!(deliveries.len(), 2);

    let mut reports = deliveries.join().await;
    reports.sort_by_key(|r| r.channel);
    assert!(reports[0].success);
    assert!(!reports[1].success);
    assert_eq!(reports[1].channel, ChannelKind::Webhook);
    assert_eq!(reports[1].alert_id, alert_id);
    assert!(reports[1].error.as_deref().unwrap().contains("offline"));
    assert_eq!(ok.seen.lock().unwrap().as_slice(), &[alert_id]);
  }

  #[tokio::test]
  async fn test_listeners_receive_in_order() {
    let mut dispatcher = AlertDispatcher::with_limits(20, 100);
    let mut rx = dispatcher.subscribe();

    dispatcher.dispatch_all(vec![raised("first", vec![]), raised("second", vec![])]);

    assert_eq!(rx.recv().await.unwrap().title, "first");
    assert_eq!(rx.recv().await.unwrap().title, "second");
  }
}
