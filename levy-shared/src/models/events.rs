use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Why a tax computation fell back to zero tax
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Order charges could not be read (missing order or store outage)
    DataUnavailable,
    /// Bad environment string, incomplete address, missing credentials
    ConfigurationError,
    NetworkError,
    HttpError,
    ParseError,
}

impl FailureKind {
    /// Configuration problems are deployment defects and page someone;
    /// everything else is expected to clear up on its own.
    pub fn severity(&self) -> Severity {
        match self {
            FailureKind::ConfigurationError => Severity::Alert,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::DataUnavailable => "DATA_UNAVAILABLE",
            FailureKind::ConfigurationError => "CONFIGURATION_ERROR",
            FailureKind::NetworkError => "NETWORK_ERROR",
            FailureKind::HttpError => "HTTP_ERROR",
            FailureKind::ParseError => "PARSE_ERROR",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Alert,
    Warning,
}

/// Emitted whenever an order's tax was failed open to zero
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TaxFailureEvent {
    pub event_id: Uuid,
    pub order_id: String,
    pub failure_kind: FailureKind,
    pub severity: Severity,
    pub detail: String,
    pub site_name: Option<String>,
    pub site_type: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl TaxFailureEvent {
    pub fn new(order_id: &str, failure_kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            order_id: order_id.to_string(),
            failure_kind,
            severity: failure_kind.severity(),
            detail: detail.into(),
            site_name: None,
            site_type: None,
            occurred_at: Utc::now(),
        }
    }

    /// Tag the event with the storefront it came from ("Live"/"Dev" style site types)
    pub fn with_site(mut self, site_name: Option<String>, site_type: Option<String>) -> Self {
        self.site_name = site_name;
        self.site_type = site_type;
        self
    }

    /// One-line summary used as a notification subject
    pub fn subject(&self) -> String {
        let site = match (&self.site_type, &self.site_name) {
            (Some(kind), Some(name)) => format!("The {} storefront \"{}\"", kind, name),
            (None, Some(name)) => format!("Storefront \"{}\"", name),
            _ => "Storefront".to_string(),
        };
        format!("{} failed open on tax for order {} ({})", site, self.order_id, self.failure_kind)
    }
}
