use serde::{Deserialize, Serialize};

use crate::money::{Currency, Money, MoneyError};

/// Shipping destination of an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    /// State or province code, e.g. "GA"
    pub region: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    /// First required field that is blank, if any.
    ///
    /// `region` and `country` drive taxation; `line1`, `city` and `postal_code`
    /// are required by the tax engine.
    pub fn missing_required_field(&self) -> Option<&'static str> {
        [
            ("line1", &self.line1),
            ("city", &self.city),
            ("region", &self.region),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// Everything taxable about one order, read fresh from the gateway per computation.
///
/// Fields are private so a charge set cannot be altered after the gateway builds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeSet {
    order_id: String,
    currency: Currency,
    line_item_prices: Vec<Money>,
    shipping_charge: Money,
    handling_charge: Money,
    shipping_and_handling: Money,
    shipping_address: Address,
}

impl ChargeSet {
    pub fn new(
        order_id: impl Into<String>,
        currency: Currency,
        line_item_prices: Vec<Money>,
        shipping_charge: Money,
        handling_charge: Money,
        shipping_address: Address,
    ) -> Result<Self, MoneyError> {
        for price in line_item_prices.iter().chain([&shipping_charge, &handling_charge]) {
            if price.currency() != &currency {
                return Err(MoneyError::CurrencyMismatch {
                    left: currency,
                    right: price.currency().clone(),
                });
            }
        }

        let shipping_and_handling = shipping_charge.checked_add(&handling_charge)?;

        Ok(Self {
            order_id: order_id.into(),
            currency,
            line_item_prices,
            shipping_charge,
            handling_charge,
            shipping_and_handling,
            shipping_address,
        })
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn line_item_prices(&self) -> &[Money] {
        &self.line_item_prices
    }

    pub fn shipping_charge(&self) -> &Money {
        &self.shipping_charge
    }

    pub fn handling_charge(&self) -> &Money {
        &self.handling_charge
    }

    /// Shipping and handling are always taxed together as one amount
    pub fn shipping_and_handling(&self) -> &Money {
        &self.shipping_and_handling
    }

    pub fn shipping_address(&self) -> &Address {
        &self.shipping_address
    }
}
