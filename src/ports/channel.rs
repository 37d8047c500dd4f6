//! Alert Channel Port - Outbound Notification Interface
//!
//! Every notification target (console, browser, sound, email, webhook)
//! implements `AlertChannel`. The dispatcher only sees this trait and
//! never depends on transport details.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::alert::{Alert, ChannelKind};

/// Failure delivering an alert through one channel.
///
/// Never propagated past the delivery task; it is logged and turned
/// into an unsuccessful `DeliveryReport`.
#[derive(Error, Debug)]
pub enum ChannelError {
  /// Transport-level failure (connect, TLS, timeout).
  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  /// Endpoint answered with a non-success status.
  #[error("endpoint returned {status}: {body}")]
  Status { status: u16, body: String },

  /// Channel cannot deliver in the current environment.
  #[error("channel unavailable: {0}")]
  Unavailable(String),

  /// Payload could not be encoded.
  #[error("encode error: {0}")]
  Encode(#[from] serde_json::Error),
}

/// Trait for alert delivery channels.
#[async_trait]
pub trait AlertChannel: Send + Sync + 'static {
  /// Channel this adapter serves.
  fn kind(&self) -> ChannelKind;

  /// Deliver one alert.
  async fn send(&self, alert: &Alert) -> Result<(), ChannelError>;
}
