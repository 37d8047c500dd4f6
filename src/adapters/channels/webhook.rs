//! Webhook Channel - Generic, Slack and Discord Payloads
//!
//! Posts each alert to every configured webhook. Payload shape depends
//! on the target format:
//! - Generic: `{type: "alert", alert: {id, timestamp, type, severity, ...}}`
//! - Slack: attachment card coloured by severity
//! - Discord: embed coloured by severity
//!
//! Targets with a secret get an `X-Signature-256` header carrying the
//! base64 HMAC-SHA256 of the body.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::{WebhookConfig, WebhookFormat};
use crate::domain::alert::{Alert, ChannelKind, Severity};
use crate::ports::channel::{AlertChannel, ChannelError};

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "X-Signature-256";

/// One resolved webhook endpoint.
#[derive(Debug, Clone)]
pub struct WebhookTarget {
  pub url: String,
  pub format: WebhookFormat,
  /// Signing secret, resolved from the environment.
  pub secret: Option<String>,
  pub timeout: Duration,
}

impl WebhookTarget {
  /// Resolve a configured webhook. A missing secret variable disables signing.
  pub fn from_config(config: &WebhookConfig) -> Self {
    let secret = config.secret_env.as_deref().and_then(|name| {
      let secret = std::env::var(name).ok();
      if secret.is_none() {
        warn!(env = name, url = %config.url, "Webhook secret variable not set, sending unsigned");
      }
      secret
    });

    Self {
      url: config.url.clone(),
      format: config.format,
      secret,
      timeout: Duration::from_secs(config.timeout_seconds),
    }
  }
}

/// Webhook fan-out over all configured targets.
pub struct WebhookChannel {
  /// Underlying HTTP client.
  http: Client,
  /// Endpoints in configuration order.
  targets: Vec<WebhookTarget>,
}

impl WebhookChannel {
  /// Create a channel over resolved targets.
  pub fn new(targets: Vec<WebhookTarget>) -> Result<Self> {
    let http = Client::builder()
      .pool_max_idle_per_host(2)
      .build()
      .context("Failed to build webhook HTTP client")?;

    Ok(Self { http, targets })
  }

  /// Create a channel from config entries.
  pub fn from_config(configs: &[WebhookConfig]) -> Result<Self> {
    Self::new(configs.iter().map(WebhookTarget::from_config).collect())
  }

  pub fn targets(&self) -> &[WebhookTarget] {
    &self.targets
  }

  async fn post(&self, target: &WebhookTarget, alert: &Alert) -> Result<(), ChannelError> {
    let body = serde_json::to_vec(&payload(target.format, alert))?;

    let mut request = self
      .http
      .post(&target.url)
      .timeout(target.timeout)
      .header(reqwest::header::CONTENT_TYPE, "application/json");
    if let Some(secret) = &target.secret {
      request = request.header(SIGNATURE_HEADER, sign(&body, secret));
    }

    let response = request.body(body).send().await?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(ChannelError::Status {
        status: status.as_u16(),
        body,
      });
    }

    debug!(alert_id = %alert.id, url = %target.url, "Webhook delivered");
    Ok(())
  }
}

#[async_trait]
impl AlertChannel for WebhookChannel {
  fn kind(&self) -> ChannelKind {
    ChannelKind::Webhook
  }

  /// Tries every target; the first failure is returned after all attempts.
  async fn send(&self, alert: &Alert) -> Result<(), ChannelError> {
    if self.targets.is_empty() {
      return Err(ChannelError::Unavailable("no webhook targets configured".into()));
    }

    let mut first_error = None;
    for target in &self.targets {
      if let Err(e) = self.post(target, alert).await {
        warn!(alert_id = %alert.id, url = %target.url, error = %e, "Webhook delivery failed");
        first_error.get_or_insert(e);
      }
    }

    first_error.map_or(Ok(()), Err)
  }
}

/// Build the JSON body for a target format.
pub fn payload(format: WebhookFormat, alert: &Alert) -> Value {
  match format {
    WebhookFormat::Generic => json!({
      "type": "alert",
      "alert": {
        "id": alert.id,
        "timestamp": alert.timestamp.to_rfc3339(),
        "type": alert.alert_type,
        "severity": alert.severity,
        "title": alert.title,
        "message": alert.message,
        "data": alert.data,
      },
    }),
    WebhookFormat::Slack => json!({
      "text": alert.title,
      "attachments": [{
        "color": slack_colour(alert.severity),
        "title": alert.title,
        "text": alert.message,
        "footer": format!("{} | {}", alert.alert_type, alert.severity.tag()),
        "ts": alert.timestamp.timestamp(),
      }],
    }),
    WebhookFormat::Discord => json!({
      "embeds": [{
        "title": alert.title,
        "description": alert.message,
        "color": discord_colour(alert.severity),
        "footer": { "text": format!("{} | {}", alert.alert_type, alert.severity.tag()) },
        "timestamp": alert.timestamp.to_rfc3339(),
      }],
    }),
  }
}

/// Base64 HMAC-SHA256 of the body.
pub fn sign(body: &[u8], secret: &str) -> String {
  let mac = hmac_sha256::HMAC::mac(body, secret.as_bytes());
  base64::engine::general_purpose::STANDARD.encode(mac)
}

fn slack_colour(severity: Severity) -> &'static str {
  match severity {
    Severity::Low => "#36a64f",
    Severity::Medium => "#f2c744",
    Severity::High => "#ff8c00",
    Severity::Critical => "#e01e5a",
  }
}

fn discord_colour(severity: Severity) -> u32 {
  match severity {
    Severity::Low => 0x36_a6_4f,
    Severity::Medium => 0xf2_c7_44,
    Severity::High => 0xff_8c_00,
    Severity::Critical => 0xe0_1e_5a,
  }
}
