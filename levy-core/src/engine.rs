use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use levy_shared::{FailureKind, Masked};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::money::{Currency, Money};
use crate::tax_request::TaxRequest;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Tax engine misconfigured: {0}")]
    Configuration(String),
    #[error("Tax engine unreachable: {0}")]
    Network(String),
    #[error("Tax engine returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Unreadable tax engine response: {0}")]
    Parse(String),
}

impl EngineError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            EngineError::Configuration(_) => FailureKind::ConfigurationError,
            EngineError::Network(_) => FailureKind::NetworkError,
            EngineError::Http { .. } => FailureKind::HttpError,
            EngineError::Parse(_) => FailureKind::ParseError,
        }
    }
}

/// Which tax engine account the calls go to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Sandbox,
}

impl FromStr for Environment {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "sandbox" => Ok(Environment::Sandbox),
            other => Err(EngineError::Configuration(format!(
                "unrecognized environment {:?}, expected \"production\" or \"sandbox\"",
                other
            ))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => f.write_str("production"),
            Environment::Sandbox => f.write_str("sandbox"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEndpoint {
    pub environment: Environment,
    pub url: String,
}

/// The two transaction endpoints a deployment can point at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSet {
    pub production_url: String,
    pub sandbox_url: String,
}

impl EndpointSet {
    /// Resolve the configured environment string. Never falls back to a default endpoint.
    pub fn resolve(&self, environment: &str) -> Result<EngineEndpoint, EngineError> {
        let environment: Environment = environment.parse()?;
        let url = match environment {
            Environment::Production => &self.production_url,
            Environment::Sandbox => &self.sandbox_url,
        };
        if url.trim().is_empty() {
            return Err(EngineError::Configuration(format!("no {} endpoint configured", environment)));
        }
        Ok(EngineEndpoint {
            environment,
            url: url.clone(),
        })
    }
}

impl Default for EndpointSet {
    fn default() -> Self {
        Self {
            production_url: "https://rest.avatax.com/api/v2/transactions/create".to_string(),
            sandbox_url: "https://sandbox-rest.avatax.com/api/v2/transactions/create".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub password: Masked<String>,
}

impl Credentials {
    pub fn new(user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            password: Masked(password.into()),
        }
    }

    /// `Basic <base64(user_id:password)>`.
    ///
    /// Blank credentials are a configuration error rather than an empty or half-built header.
    pub fn basic_auth_value(&self) -> Result<String, EngineError> {
        if self.user_id.trim().is_empty() || self.password.expose().is_empty() {
            return Err(EngineError::Configuration("missing credentials".to_string()));
        }
        if self.user_id.contains(':') {
            return Err(EngineError::Configuration("user id cannot contain ':'".to_string()));
        }
        let pair = format!("{}:{}", self.user_id, self.password.expose());
        Ok(format!("Basic {}", STANDARD.encode(pair.as_bytes())))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxResult {
    pub total_tax: Money,
}

/// Read `totalTax` out of an engine response body.
///
/// A missing or non-numeric field is a parse error, never zero tax.
pub fn parse_total_tax(body: &str, currency: &Currency) -> Result<TaxResult, EngineError> {
    let json: serde_json::Value =
        serde_json::from_str(body).map_err(|e| EngineError::Parse(format!("invalid JSON: {}", e)))?;

    let number = match json.get("totalTax") {
        Some(serde_json::Value::Number(number)) => number.to_string(),
        Some(other) => {
            return Err(EngineError::Parse(format!("totalTax is not a number: {}", other)));
        }
        None => return Err(EngineError::Parse("response has no totalTax".to_string())),
    };

    let amount = Decimal::from_str(&number)
        .or_else(|_| Decimal::from_scientific(&number))
        .map_err(|e| EngineError::Parse(format!("totalTax {} out of range: {}", number, e)))?;

    let total_tax = Money::new(amount, currency.clone())
        .map_err(|e| EngineError::Parse(format!("totalTax rejected: {}", e)))?;

    Ok(TaxResult { total_tax })
}

/// Remote tax computation; one round trip per call, no retries
#[async_trait]
pub trait TaxEngineClient: Send + Sync {
    async fn compute_tax(
        &self,
        request: &TaxRequest,
        credentials: &Credentials,
        endpoint: &EngineEndpoint,
    ) -> Result<TaxResult, EngineError>;
}
