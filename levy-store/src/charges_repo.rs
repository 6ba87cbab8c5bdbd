use async_trait::async_trait;
use levy_core::{Address, ChargeSet, Currency, GatewayError, Money, OrderChargesGateway};
use sqlx::PgPool;
use tracing::debug;

/// Reads order charges from the storefront tables
pub struct PgOrderChargesGateway {
    pool: PgPool,
}

impl PgOrderChargesGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderGroupRow {
    pub currency_code: String,
    pub handling_charge: Option<i64>,
    pub shipping_address1: String,
    pub shipping_address2: Option<String>,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_postal_code: String,
    pub shipping_country: String,
}

#[async_trait]
impl OrderChargesGateway for PgOrderChargesGateway {
    async fn fetch(&self, order_id: &str) -> Result<ChargeSet, GatewayError> {
        // One read transaction: a consistent snapshot, and the connection goes back
        // to the pool when `tx` drops on any path.
        let mut tx = self.pool.begin().await.map_err(transient)?;

        let group = sqlx::query_as::<_, OrderGroupRow>(
            r#"
            SELECT currency_code, handling_charge, shipping_address1, shipping_address2,
                   shipping_city, shipping_state, shipping_postal_code, shipping_country
            FROM order_groups
            WHERE order_group_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(transient)?
        .ok_or_else(|| GatewayError::NotFound(order_id.to_string()))?;

        let shipping: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(shipping_amount), 0)::BIGINT FROM shipments WHERE order_group_id = $1",
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(transient)?;

        let prices: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT price FROM ordered_documents
            WHERE order_group_id = $1
            ORDER BY line_number, document_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(transient)?;

        tx.commit().await.map_err(transient)?;

        debug!(order_id, items = prices.len(), shipping, "Loaded order charge rows");
        charge_set_from_rows(order_id, group, shipping, &prices)
    }
}

/// Turn raw rows (minor units) into a charge set in the order's currency
pub fn charge_set_from_rows(
    order_id: &str,
    group: OrderGroupRow,
    shipping_minor_units: i64,
    price_minor_units: &[i64],
) -> Result<ChargeSet, GatewayError> {
    let invalid = |e: levy_core::MoneyError| {
        GatewayError::Transient(format!("invalid charge data for order {}: {}", order_id, e))
    };

    let currency = Currency::new(&group.currency_code).map_err(invalid)?;
    let prices = price_minor_units
        .iter()
        .map(|cents| Money::from_minor_units(*cents, currency.clone()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(invalid)?;
    let shipping = Money::from_minor_units(shipping_minor_units, currency.clone()).map_err(invalid)?;
    let handling = Money::from_minor_units(group.handling_charge.unwrap_or(0), currency.clone()).map_err(invalid)?;

    let address = Address {
        line1: group.shipping_address1,
        line2: group.shipping_address2.filter(|line| !line.trim().is_empty()),
        city: group.shipping_city,
        region: group.shipping_state,
        postal_code: group.shipping_postal_code,
        country: group.shipping_country,
    };

    ChargeSet::new(order_id, currency, prices, shipping, handling, address).map_err(invalid)
}

fn transient(error: sqlx::Error) -> GatewayError {
    GatewayError::Transient(error.to_string())
}
