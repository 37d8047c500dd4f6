//! Sound Channel - Terminal Bell
//!
//! Rings the bell on an interactive stderr. Under a service manager or
//! with redirected output it does nothing.

use std::io::IsTerminal;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::domain::alert::{Alert, ChannelKind};
use crate::ports::channel::{AlertChannel, ChannelError};

const BELL: &[u8] = b"\x07";

#[derive(Debug, Default, Clone)]
pub struct SoundChannel;

#[async_trait]
impl AlertChannel for SoundChannel {
  fn kind(&self) -> ChannelKind {
    ChannelKind::Sound
  }

  async fn send(&self, alert: &Alert) -> Result<(), ChannelError> {
    if !std::io::stderr().is_terminal() {
      debug!(alert_id = %alert.id, "stderr is not a terminal, bell skipped");
      return Ok(());
    }

    let mut stderr = tokio::io::stderr();
    stderr
      .write_all(BELL)
      .await
      .map_err(|e| ChannelError::Unavailable(format!("terminal bell failed: {e}")))?;
    stderr
      .flush()
      .await
      .map_err(|e| ChannelError::Unavailable(format!("terminal bell failed: {e}")))
  }
}
