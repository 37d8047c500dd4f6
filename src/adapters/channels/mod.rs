//! Alert Channel Adapters
//!
//! Concrete `AlertChannel` implementations and the factory that wires
//! them from `[channels]` config.

pub mod browser;
pub mod console;
pub mod email;
pub mod sound;
pub mod webhook;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::ChannelsConfig;
use crate::ports::channel::AlertChannel;

pub use browser::BrowserChannel;
pub use console::ConsoleChannel;
pub use email::{EmailChannel, EmailMessage};
pub use sound::SoundChannel;
pub use webhook::{WebhookChannel, WebhookTarget};

/// Build every channel enabled in config.
pub fn build_channels(config: &ChannelsConfig) -> Result<Vec<Arc<dyn AlertChannel>>> {
  let mut channels: Vec<Arc<dyn AlertChannel>> = Vec::new();

  if config.console {
    channels.push(Arc::new(ConsoleChannel));
  }
  if config.browser {
    channels.push(Arc::new(BrowserChannel));
  }
  if config.sound {
    channels.push(Arc::new(SoundChannel));
  }
  if let Some(email) = &config.email {
    channels.push(Arc::new(EmailChannel::new(email.clone())?));
  }
  if !config.webhooks.is_empty() {
    channels.push(Arc::new(WebhookChannel::from_config(&config.webhooks)?));
  }

  info!(
    channels = ?channels.iter().map(|c| c.kind()).collect::<Vec<_>>(),
    "Alert channels ready"
  );

  Ok(channels)
}
