//! Email Channel - HTTP Mail API Delivery
//!
//! Renders each alert into an `EmailMessage` (subject `[SEVERITY] Title`,
//! HTML and plain-text bodies) and POSTs it as JSON to a transactional
//! mail API. The bearer token is read from an environment variable.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::EmailConfig;
use crate::domain::alert::{Alert, ChannelKind};
use crate::ports::channel::{AlertChannel, ChannelError};

/// Mail API request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
  pub from: String,
  pub to: Vec<String>,
  pub subject: String,
  pub html: String,
  pub text: String,
}

impl EmailMessage {
  /// Render an alert for the given sender and recipients.
  pub fn from_alert(alert: &Alert, from: &str, to: &[String]) -> Self {
    let subject = format!("[{}] {}", alert.severity.tag(), alert.title);
    let timestamp = alert.timestamp.to_rfc3339();

    let text = format!(
      "{}\n\n{}\n\nType: {}\nSeverity: {}\nTime: {}\nAlert ID: {}\n",
      alert.title, alert.message, alert.alert_type, alert.severity, timestamp, alert.id
    );

    let html = format!(
      "<h2>{}</h2>\n<p>{}</p>\n<table>\n\
       <tr><td>Type</td><td>{}</td></tr>\n\
       <tr><td>Severity</td><td>{}</td></tr>\n\
       <tr><td>Time</td><td>{}</td></tr>\n\
       </table>\n<p><small>Alert ID {}</small></p>",
      escape_html(&alert.title),
      escape_html(&alert.message),
      alert.alert_type,
      alert.severity,
      timestamp,
      alert.id
    );

    Self {
      from: from.to_string(),
      to: to.to_vec(),
      subject,
      html,
      text,
    }
  }
}

/// Email delivery through an HTTP mail API.
pub struct EmailChannel {
  /// Underlying HTTP client.
  http: Client,
  /// Endpoint, sender and recipients.
  config: EmailConfig,
  /// Bearer token, if configured.
  api_key: Option<String>,
}

impl EmailChannel {
  /// Create the channel, resolving the API key from the environment.
  pub fn new(config: EmailConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(Duration::from_secs(config.timeout_seconds))
      .pool_max_idle_per_host(2)
      .build()
      .context("Failed to build email HTTP client")?;

    let api_key = config.api_key_env.as_deref().and_then(|name| {
      let key = std::env::var(name).ok();
      if key.is_none() {
        warn!(env = name, "Email API key variable not set, sending unauthenticated");
      }
      key
    });

    Ok(Self {
      http,
      config,
      api_key,
    })
  }
}

#[async_trait]
impl AlertChannel for EmailChannel {
  fn kind(&self) -> ChannelKind {
    ChannelKind::Email
  }

  async fn send(&self, alert: &Alert) -> Result<(), ChannelError> {
    let message = EmailMessage::from_alert(alert, &self.config.from, &self.config.to);

    let mut request = self.http.post(&self.config.api_url).json(&message);
    if let Some(key) = &self.api_key {
      request = request.bearer_auth(key);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(ChannelError::Status {
        status: status.as_u16(),
        body,
      });
    }

    debug!(alert_id = %alert.id, recipients = self.config.to.len(), "Email sent");
    Ok(())
  }
}

fn escape_html(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  for c in raw.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(c),
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::alert::{AlertType, Severity};

  #[test]
  fn test_subject_has_severity_tag() {
    let alert = Alert::new(
      AlertType::Arbitrage,
      Severity::Critical,
      "Arbitrage: 2.50% guaranteed",
      "Stake split",
      serde_json::Value::Null,
    );
    let message = EmailMessage::from_alert(&alert, "bot@example.com", &["me@example.com".to_string()]);

    assert_eq!(message.subject, "[CRITICAL] Arbitrage: 2.50% guaranteed");
    assert!(message.text.contains("Stake split"));
    assert!(message.html.contains("<h2>Arbitrage: 2.50% guaranteed</h2>"));
    assert_eq!(message.to, vec!["me@example.com".to_string()]);
  }

  #[test]
  fn test_html_is_escaped() {
    assert_eq!(escape_html("<b>A & B</b>"), "&lt;b&gt;A &amp; B&lt;/b&gt;");
  }
}
