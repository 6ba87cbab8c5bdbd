use levy_core::{EndpointSet, TaxableRegion};
use levy_shared::Masked;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    pub kafka: Option<KafkaConfig>,
    #[serde(default)]
    pub site: SiteConfig,
    pub tax_engine: TaxEngineConfig,
    pub jurisdiction: JurisdictionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: Masked<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
    /// Create the storefront tables on startup; for local development only
    #[serde(default)]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout_ms() -> u64 { 3_000 }

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { timeout_ms: default_timeout_ms() }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    #[serde(default = "default_failure_topic")]
    pub failure_topic: String,
}

fn default_failure_topic() -> String { "tax.failures".to_string() }

/// Identifies the storefront in failure notifications
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SiteConfig {
    pub name: Option<String>,
    /// "Live" or "Dev"
    pub site_type: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TaxEngineConfig {
    /// "production" or "sandbox", any casing
    pub environment: String,
    pub company_code: String,
    pub customer_code: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub password: Masked<String>,
    #[serde(default = "default_production_url")]
    pub production_url: String,
    #[serde(default = "default_sandbox_url")]
    pub sandbox_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_timeout_ms() -> u64 { 15_000 }
fn default_currency() -> String { "USD".to_string() }
fn default_production_url() -> String { EndpointSet::default().production_url }
fn default_sandbox_url() -> String { EndpointSet::default().sandbox_url }

impl TaxEngineConfig {
    pub fn endpoints(&self) -> EndpointSet {
        EndpointSet {
            production_url: self.production_url.clone(),
            sandbox_url: self.sandbox_url.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct JurisdictionConfig {
    #[serde(default)]
    pub taxable_regions: Vec<TaxableRegion>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `LEVY__TAX_ENGINE__PASSWORD=...`
            .add_source(config::Environment::with_prefix("LEVY").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Load from a TOML document, without files or environment variables
    pub fn from_toml(document: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(document, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
