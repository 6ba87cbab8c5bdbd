use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use levy_core::Money;
use levy_order::TaxOutcome;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TaxQuoteRequest {
    /// The storefront's placeholder; replaced by the computed tax
    #[serde(default)]
    pub taxable_amount: Decimal,
    /// Set by the storefront on its rejection page, where tax is never computed
    #[serde(default)]
    pub rejected: bool,
}

#[derive(Debug, Serialize)]
pub struct TaxQuoteResponse {
    pub order_id: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub tax: Decimal,
    pub currency: String,
    pub outcome: TaxOutcome,
}

impl TaxQuoteResponse {
    fn new(order_id: String, tax: &Money, outcome: TaxOutcome) -> Self {
        Self {
            order_id,
            tax: tax.amount(),
            currency: tax.currency().code().to_string(),
            outcome,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/orders/{order_id}/tax", post(compute_order_tax))
        .route("/health", get(health))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/orders/{order_id}/tax
///
/// Always answers with a tax figure once the request is well formed. A client that hangs
/// up drops this future, which abandons the computation without a notification.
pub async fn compute_order_tax(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    payload: Result<Json<TaxQuoteRequest>, JsonRejection>,
) -> Result<Json<TaxQuoteResponse>, AppError> {
    let Json(req) = payload?;

    if order_id.trim().is_empty() {
        return Err(AppError::ValidationError("order id is required".to_string()));
    }
    if req.taxable_amount.is_sign_negative() && !req.taxable_amount.is_zero() {
        return Err(AppError::ValidationError("taxable_amount cannot be negative".to_string()));
    }

    if req.rejected {
        tracing::debug!(order_id = %order_id, "Rejection page, no tax computed");
        let zero = Money::zero(state.orchestrator.settings().default_currency.clone());
        return Ok(Json(TaxQuoteResponse::new(order_id, &zero, TaxOutcome::Skipped)));
    }

    let computation = state
        .orchestrator
        .compute_tax(&order_id, req.taxable_amount)
        .await;

    Ok(Json(TaxQuoteResponse::new(
        computation.order_id,
        &computation.tax,
        computation.outcome,
    )))
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
