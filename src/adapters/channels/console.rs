//! Console Channel - Alerts as Structured Log Events

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::alert::{Alert, ChannelKind, Severity};
use crate::ports::channel::{AlertChannel, ChannelError};

/// Emits each alert as a `tracing` event. High and critical alerts
/// are logged at warn level.
#[derive(Debug, Default, Clone)]
pub struct ConsoleChannel;

#[async_trait]
impl AlertChannel for ConsoleChannel {
  fn kind(&self) -> ChannelKind {
    ChannelKind::Console
  }

  async fn send(&self, alert: &Alert) -> Result<(), ChannelError> {
    match alert.severity {
      Severity::High | Severity::Critical => warn!(
        alert_id = %alert.id,
        alert_type = %alert.alert_type,
        severity = %alert.severity,
        message = %alert.message,
        "{}",
        alert.title
      ),
      Severity::Low | Severity::Medium => info!(
        alert_id = %alert.id,
        alert_type = %alert.alert_type,
        severity = %alert.severity,
        message = %alert.message,
        "{}",
        alert.title
      ),
    }
    Ok(())
  }
}
