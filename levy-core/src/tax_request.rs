use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::charges::Address;
use crate::money::{Currency, Money, MoneyError};

/// Date representation expected by the tax engine
pub const TRANSACTION_DATE_FORMAT: &str = "%Y/%m/%d";

/// Document type sent with every transaction; a sales order is quoted, never committed
pub const TRANSACTION_TYPE: &str = "SalesOrder";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("Shipping address is missing {0}")]
    IncompleteAddress(&'static str),
    #[error("Tax engine {0} is not configured")]
    MissingAccountCode(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum RequestDecodeError {
    #[error("Malformed request body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Malformed transaction date: {0}")]
    Date(#[from] chrono::ParseError),
    #[error(transparent)]
    Money(#[from] MoneyError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineAmount {
    pub amount: Money,
}

/// A canonical tax computation request for one order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxRequest {
    company_code: String,
    customer_code: String,
    transaction_date: NaiveDate,
    address: Address,
    currency: Currency,
    lines: Vec<LineAmount>,
}

impl TaxRequest {
    pub fn new(
        company_code: String,
        customer_code: String,
        transaction_date: NaiveDate,
        address: Address,
        currency: Currency,
        lines: Vec<LineAmount>,
    ) -> Self {
        Self {
            company_code,
            customer_code,
            transaction_date,
            address,
            currency,
            lines,
        }
    }

    pub fn company_code(&self) -> &str {
        &self.company_code
    }

    pub fn customer_code(&self) -> &str {
        &self.customer_code
    }

    pub fn transaction_date(&self) -> NaiveDate {
        self.transaction_date
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn lines(&self) -> &[LineAmount] {
        &self.lines
    }

    /// Wire shape of the request
    pub fn to_body(&self) -> TransactionBody {
        TransactionBody {
            company_code: self.company_code.clone(),
            transaction_type: TRANSACTION_TYPE.to_string(),
            date: self.transaction_date.format(TRANSACTION_DATE_FORMAT).to_string(),
            customer_code: self.customer_code.clone(),
            addresses: AddressesBody {
                single_location: LocationBody {
                    line1: self.address.line1.clone(),
                    line2: self.address.line2.clone(),
                    city: self.address.city.clone(),
                    region: self.address.region.clone(),
                    country: self.address.country.clone(),
                    postal_code: self.address.postal_code.clone(),
                },
            },
            lines: self
                .lines
                .iter()
                .map(|line| LineBody {
                    amount: line.amount.amount(),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_body())
    }

    /// Parse a request body back, e.g. one captured by a test double.
    /// The wire format carries no currency, so the caller supplies it.
    pub fn from_json(json: &str, currency: Currency) -> Result<Self, RequestDecodeError> {
        let body: TransactionBody = serde_json::from_str(json)?;
        let transaction_date = NaiveDate::parse_from_str(&body.date, TRANSACTION_DATE_FORMAT)?;
        let lines = body
            .lines
            .into_iter()
            .map(|line| {
                Money::new(line.amount, currency.clone()).map(|amount| LineAmount { amount })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let location = body.addresses.single_location;

        Ok(Self {
            company_code: body.company_code,
            customer_code: body.customer_code,
            transaction_date,
            address: Address {
                line1: location.line1,
                line2: location.line2,
                city: location.city,
                region: location.region,
                postal_code: location.postal_code,
                country: location.country,
            },
            currency,
            lines,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBody {
    pub company_code: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub date: String,
    pub customer_code: String,
    pub addresses: AddressesBody,
    pub lines: Vec<LineBody>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressesBody {
    pub single_location: LocationBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationBody {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub country: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineBody {
    /// Written as a JSON number with the exact decimal digits
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
}
