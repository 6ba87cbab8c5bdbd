pub mod charges;
pub mod engine;
pub mod gateway;
pub mod jurisdiction;
pub mod money;
pub mod notifier;
pub mod tax_request;

pub use charges::{Address, ChargeSet};
pub use engine::{parse_total_tax, Credentials, EndpointSet, EngineEndpoint, EngineError, Environment, TaxEngineClient, TaxResult};
pub use gateway::{GatewayError, OrderChargesGateway};
pub use jurisdiction::{JurisdictionPolicy, RegionSetPolicy, TaxableRegion};
pub use levy_shared::{FailureKind, Severity, TaxFailureEvent};
pub use money::{Currency, Money, MoneyError};
pub use notifier::{FanoutNotifier, LogNotifier, Notifier};
pub use tax_request::{BuildError, LineAmount, TaxRequest};

/// Everything that can make a tax computation fail open
#[derive(Debug, thiserror::Error)]
pub enum TaxError {
    #[error(transparent)]
    DataUnavailable(#[from] GatewayError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Tax engine call timed out after {0}ms")]
    EngineTimeout(u64),
}

impl TaxError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            TaxError::DataUnavailable(_) => FailureKind::DataUnavailable,
            TaxError::Build(_) => FailureKind::ConfigurationError,
            TaxError::Engine(e) => e.failure_kind(),
            TaxError::EngineTimeout(_) => FailureKind::NetworkError,
        }
    }
}

pub type CoreResult<T> = Result<T, TaxError>;
