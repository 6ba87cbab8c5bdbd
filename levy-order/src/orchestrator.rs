use chrono::NaiveDate;
use levy_core::{
    ChargeSet, CoreResult, Credentials, Currency, EndpointSet, FailureKind, GatewayError,
    JurisdictionPolicy, Money, Notifier, OrderChargesGateway, Severity, TaxEngineClient, TaxError,
    TaxFailureEvent, TaxResult,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::request_builder;

/// Deployment settings the orchestrator needs for every call
#[derive(Debug, Clone)]
pub struct TaxSettings {
    pub company_code: String,
    pub customer_code: String,
    pub credentials: Credentials,
    /// Raw configured value; validated on every call so a bad value fails open loudly
    pub environment: String,
    pub endpoints: EndpointSet,
    /// Currency of the zero tax returned when an order's own currency is unknown
    pub default_currency: Currency,
    pub gateway_timeout: Duration,
    pub engine_timeout: Duration,
    pub site_name: Option<String>,
    pub site_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "status", content = "failure_kind")]
pub enum TaxOutcome {
    /// The tax engine computed the tax
    Computed,
    /// Shipping region is not taxable; the engine was not called
    Skipped,
    /// Something failed and the order proceeds with zero tax
    FailedOpen(FailureKind),
}

/// Final answer for one order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxComputation {
    pub order_id: String,
    pub tax: Money,
    pub outcome: TaxOutcome,
}

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Computes the tax for one order at a time.
///
/// Holds only injected collaborators and settings; every value derived from an order
/// lives on the stack of a single `compute_tax` call, so one instance can serve
/// concurrent checkouts.
pub struct TaxOrchestrator {
    gateway: Arc<dyn OrderChargesGateway>,
    policy: Arc<dyn JurisdictionPolicy>,
    engine: Arc<dyn TaxEngineClient>,
    notifier: Arc<dyn Notifier>,
    settings: TaxSettings,
    clock: Clock,
}

impl TaxOrchestrator {
    pub fn new(
        gateway: Arc<dyn OrderChargesGateway>,
        policy: Arc<dyn JurisdictionPolicy>,
        engine: Arc<dyn TaxEngineClient>,
        notifier: Arc<dyn Notifier>,
        settings: TaxSettings,
    ) -> Self {
        Self {
            gateway,
            policy,
            engine,
            notifier,
            settings,
            clock: Arc::new(|| chrono::Local::now().date_naive()),
        }
    }

    /// Override the transaction date source
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn settings(&self) -> &TaxSettings {
        &self.settings
    }

    /// Compute the tax to substitute for `taxable_amount`, the host's placeholder.
    ///
    /// Never fails: any error becomes zero tax plus one notification.
    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn compute_tax(&self, order_id: &str, taxable_amount: Decimal) -> TaxComputation {
        info!("Starting tax computation");
        debug!(%taxable_amount, "Placeholder taxable amount from host");

        let charges = match self.fetch_charges(order_id).await {
            Ok(charges) => charges,
            Err(e) => return self.fail_open(order_id, self.settings.default_currency.clone(), e),
        };
        debug!(
            items = charges.line_item_prices().len(),
            shipping = %charges.shipping_charge(),
            handling = %charges.handling_charge(),
            region = %charges.shipping_address().region,
            "Order charges fetched"
        );

        let currency = charges.currency().clone();

        if !self.policy.requires_tax(charges.shipping_address()) {
            info!(region = %charges.shipping_address().region, "Region not taxable, skipping tax engine");
            return TaxComputation {
                order_id: order_id.to_string(),
                tax: Money::zero(currency),
                outcome: TaxOutcome::Skipped,
            };
        }

        match self.quote(&charges).await {
            Ok(result) => {
                info!(total_tax = %result.total_tax, "Tax computed");
                TaxComputation {
                    order_id: order_id.to_string(),
                    tax: result.total_tax,
                    outcome: TaxOutcome::Computed,
                }
            }
            Err(e) => self.fail_open(order_id, currency, e),
        }
    }

    /// Like [`compute_tax`](Self::compute_tax) but abandons the call as soon as `cancelled`
    /// resolves. A cancelled call returns `None` and reports nothing.
    pub async fn compute_tax_until<C>(
        &self,
        order_id: &str,
        taxable_amount: Decimal,
        cancelled: C,
    ) -> Option<TaxComputation>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancelled => {
                info!(order_id, "Tax computation cancelled by host");
                None
            }
            computation = self.compute_tax(order_id, taxable_amount) => Some(computation),
        }
    }

    async fn fetch_charges(&self, order_id: &str) -> CoreResult<ChargeSet> {
        let timeout = self.settings.gateway_timeout;
        match tokio::time::timeout(timeout, self.gateway.fetch(order_id)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(GatewayError::Transient(format!(
                "no response within {}ms",
                timeout.as_millis()
            ))
            .into()),
        }
    }

    async fn quote(&self, charges: &ChargeSet) -> CoreResult<TaxResult> {
        let request = request_builder::build(
            charges,
            &self.settings.company_code,
            &self.settings.customer_code,
            (self.clock)(),
        )?;
        debug!(lines = request.lines().len(), "Tax request built");

        let endpoint = self.settings.endpoints.resolve(&self.settings.environment)?;
        debug!(environment = %endpoint.environment, url = %endpoint.url, "Calling tax engine");

        let timeout = self.settings.engine_timeout;
        let call = self
            .engine
            .compute_tax(&request, &self.settings.credentials, &endpoint);
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(TaxError::EngineTimeout(timeout.as_millis() as u64)),
        }
    }

    fn fail_open(&self, order_id: &str, currency: Currency, error: TaxError) -> TaxComputation {
        let kind = error.failure_kind();
        match kind.severity() {
            Severity::Alert => error!(failure_kind = %kind, "Tax failed open on a configuration defect: {}", error),
            Severity::Warning => warn!(failure_kind = %kind, "Tax failed open: {}", error),
        }

        let event = TaxFailureEvent::new(order_id, kind, error.to_string())
            .with_site(self.settings.site_name.clone(), self.settings.site_type.clone());
        self.notifier.notify(event);

        TaxComputation {
            order_id: order_id.to_string(),
            tax: Money::zero(currency),
            outcome: TaxOutcome::FailedOpen(kind),
        }
    }
}
