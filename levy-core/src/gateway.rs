use async_trait::async_trait;

use crate::charges::ChargeSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("No charges recorded for order {0}")]
    NotFound(String),
    #[error("Order charges unavailable: {0}")]
    Transient(String),
}

/// Read access to the charges of an order
#[async_trait]
pub trait OrderChargesGateway: Send + Sync {
    /// Fetch line-item prices, shipping, handling and the shipping address.
    ///
    /// Callers never pass rejected or cancelled orders here.
    async fn fetch(&self, order_id: &str) -> Result<ChargeSet, GatewayError>;
}
