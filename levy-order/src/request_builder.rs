use chrono::NaiveDate;
use levy_core::{BuildError, ChargeSet, LineAmount, TaxRequest};

/// Shape an order's charges into a tax request dated `as_of`.
///
/// One line per cart item in gateway order, then a single line for shipping plus handling.
/// The combined line is always present, even when it is zero. Amounts are only rounded when
/// they carry more digits than the currency's minor unit.
pub fn build(
    charges: &ChargeSet,
    company_code: &str,
    customer_code: &str,
    as_of: NaiveDate,
) -> Result<TaxRequest, BuildError> {
    if let Some(field) = charges.shipping_address().missing_required_field() {
        return Err(BuildError::IncompleteAddress(field));
    }
    if company_code.trim().is_empty() {
        return Err(BuildError::MissingAccountCode("company code"));
    }
    if customer_code.trim().is_empty() {
        return Err(BuildError::MissingAccountCode("customer code"));
    }

    let lines = charges
        .line_item_prices()
        .iter()
        .chain(std::iter::once(charges.shipping_and_handling()))
        .map(|price| LineAmount {
            amount: price.round_to_minor_units(),
        })
        .collect();

    Ok(TaxRequest::new(
        company_code.to_string(),
        customer_code.to_string(),
        as_of,
        charges.shipping_address().clone(),
        charges.currency().clone(),
        lines,
    ))
}
