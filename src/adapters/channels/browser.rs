//! Browser Channel - Desktop Notifications
//!
//! A server process has no browser context, so delivery is a no-op
//! that still reports success.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::alert::{Alert, ChannelKind};
use crate::ports::channel::{AlertChannel, ChannelError};

#[derive(Debug, Default, Clone)]
pub struct BrowserChannel;

#[async_trait]
impl AlertChannel for BrowserChannel {
  fn kind(&self) -> ChannelKind {
    ChannelKind::Browser
  }

  async fn send(&self, alert: &Alert) -> Result<(), ChannelError> {
    debug!(alert_id = %alert.id, "No browser context, notification skipped");
    Ok(())
  }
}
