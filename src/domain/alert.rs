//! Alert records and the rules that gate them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::classify::RiskLevel;

/// Kind of event an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    ValueBet,
    StrongValueBet,
    Arbitrage,
    MarketInefficiency,
    OddsMovement,
    ClosingLineValue,
    BankrollThreshold,
}

impl AlertType {
    /// Wire name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ValueBet => "value_bet",
            Self::StrongValueBet => "strong_value_bet",
            Self::Arbitrage => "arbitrage",
            Self::MarketInefficiency => "market_inefficiency",
            Self::OddsMovement => "odds_movement",
            Self::ClosingLineValue => "closing_line_value",
            Self::BankrollThreshold => "bankroll_threshold",
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert severity, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Upper-case tag used in email subjects.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// Outbound notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Console,
    Browser,
    Sound,
    Email,
    Webhook,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Console => "console",
            Self::Browser => "browser",
            Self::Sound => "sound",
            Self::Email => "email",
            Self::Webhook => "webhook",
        };
        f.write_str(name)
    }
}

/// A raised alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    /// Opaque structured payload (the recommendation, opportunity, ...).
    pub data: serde_json::Value,
    pub read: bool,
    pub dismissed: bool,
}

impl Alert {
    /// New unread alert stamped now.
    pub fn new(
        alert_type: AlertType,
        severity: Severity,
        title: impl Into<String>,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            alert_type,
            severity,
            title: title.into(),
            message: message.into(),
            data,
            read: false,
            dismissed: false,
        }
    }

    /// Override the timestamp (replays and tests).
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Threshold conditions of a rule. Unset fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleConditions {
    /// Minimum expected value (percent).
    #[serde(default)]
    pub min_ev: Option<f64>,
    /// Minimum model confidence.
    #[serde(default)]
    pub min_confidence: Option<f64>,
    /// Riskiest tier still alerted on.
    #[serde(default)]
    pub max_risk: Option<RiskLevel>,
    /// Minimum absolute price move (percent).
    #[serde(default)]
    pub min_odds_movement: Option<f64>,
    /// Minimum closing line value (percent).
    #[serde(default)]
    pub min_clv: Option<f64>,
    /// Alert when the bankroll drops below this amount.
    #[serde(default)]
    pub bankroll_threshold: Option<f64>,
}

/// Configuration-time rule gating one alert type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub alert_type: AlertType,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub conditions: RuleConditions,
    pub channels: Vec<ChannelKind>,
    pub priority: Severity,
}

fn default_enabled() -> bool {
    true
}

impl AlertRule {
    /// Enabled rule with no thresholds.
    pub fn new(alert_type: AlertType, priority: Severity, channels: Vec<ChannelKind>) -> Self {
        Self {
            alert_type,
            enabled: true,
            conditions: RuleConditions::default(),
            channels,
            priority,
        }
    }

    /// Builder-style conditions setter.
    #[must_use]
    pub fn with_conditions(mut self, conditions: RuleConditions) -> Self {
        self.conditions = conditions;
        self
    }

    /// Whether a recommendation-like candidate passes the EV, confidence
    /// and risk thresholds.
    pub fn accepts(&self, ev: f64, confidence: f64, risk: RiskLevel) -> bool {
        let c = &self.conditions;
        c.min_ev.is_none_or(|min| ev >= min)
            && c.min_confidence.is_none_or(|min| confidence >= min)
            && c.max_risk.is_none_or(|max| risk <= max)
    }

    /// Rule set used when the configuration defines none.
    pub fn default_rules() -> Vec<Self> {
        use ChannelKind::{Browser, Console, Email, Sound, Webhook};

        vec![
            Self::new(AlertType::StrongValueBet, Severity::High, vec![Console, Browser, Sound, Webhook])
                .with_conditions(RuleConditions {
                    min_ev: Some(10.0),
                    min_confidence: Some(0.7),
                    ..RuleConditions::default()
                }),
            Self::new(AlertType::ValueBet, Severity::Medium, vec![Console, Browser])
                .with_conditions(RuleConditions {
                    min_ev: Some(2.0),
                    max_risk: Some(RiskLevel::High),
                    ..RuleConditions::default()
                }),
            Self::new(AlertType::Arbitrage, Severity::Critical, vec![Console, Browser, Sound, Email, Webhook]),
            Self::new(AlertType::MarketInefficiency, Severity::Low, vec![Console]),
            Self::new(AlertType::OddsMovement, Severity::Medium, vec![Console]).with_conditions(
                RuleConditions {
                    min_odds_movement: Some(10.0),
                    ..RuleConditions::default()
                },
            ),
            Self::new(AlertType::ClosingLineValue, Severity::Low, vec![Console]).with_conditions(
                RuleConditions {
                    min_clv: Some(2.0),
                    ..RuleConditions::default()
                },
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_serializes_type_field() {
        let alert = Alert::new(
            AlertType::StrongValueBet,
            Severity::High,
            "t",
            "m",
            serde_json::json!({"ev": 12.0}),
        );
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["type"], "strong_value_bet");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["read"], false);
    }

    #[test]
    fn test_rule_accepts_thresholds() {
        let rule = AlertRule::new(AlertType::ValueBet, Severity::Medium, vec![ChannelKind::Console])
            .with_conditions(RuleConditions {
                min_ev: Some(5.0),
                min_confidence: Some(0.6),
                max_risk: Some(RiskLevel::Medium),
                ..RuleConditions::default()
            });
        assert!(rule.accepts(6.0, 0.7, RiskLevel::Low));
        assert!(!rule.accepts(4.0, 0.7, RiskLevel::Low));
        assert!(!rule.accepts(6.0, 0.5, RiskLevel::Low));
        assert!(!rule.accepts(6.0, 0.7, RiskLevel::High));
    }

    #[test]
    fn test_rule_deserializes_from_toml() {
        let rule: AlertRule = toml::from_str(
            r#"
            alert_type = "arbitrage"
            channels = ["console", "webhook"]
            priority = "critical"
            "#,
        )
        .unwrap();
        assert!(rule.enabled);
        assert_eq!(rule.channels, vec![ChannelKind::Console, ChannelKind::Webhook]);
        assert_eq!(rule.conditions, RuleConditions::default());
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Critical > Severity::High);
        assert_eq!(Severity::Critical.tag(), "CRITICAL");
    }
}
