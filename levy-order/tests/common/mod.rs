#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use levy_core::{
    Address, ChargeSet, Credentials, Currency, EndpointSet, EngineEndpoint, EngineError, GatewayError,
    Money, Notifier, OrderChargesGateway, RegionSetPolicy, TaxEngineClient, TaxFailureEvent,
    TaxRequest, TaxResult, TaxableRegion,
};
use levy_order::{TaxOrchestrator, TaxSettings};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn usd(amount: &str) -> Money {
    Money::new(dec(amount), Currency::usd()).unwrap()
}

pub fn address_in(region: &str) -> Address {
    Address {
        line1: "100 Peachtree St NW".to_string(),
        line2: None,
        city: "Atlanta".to_string(),
        region: region.to_string(),
        postal_code: "30303".to_string(),
        country: "US".to_string(),
    }
}

/// Two items (10.00, 25.50), shipping 5.00, handling 2.00
pub fn sample_order(order_id: &str, region: &str) -> ChargeSet {
    ChargeSet::new(
        order_id,
        Currency::usd(),
        vec![usd("10.00"), usd("25.50")],
        usd("5.00"),
        usd("2.00"),
        address_in(region),
    )
    .unwrap()
}

pub fn settings() -> TaxSettings {
    TaxSettings {
        company_code: "PRINTCO".to_string(),
        customer_code: "STOREFRONT".to_string(),
        credentials: Credentials::new("svc-levy", "secret"),
        environment: "Sandbox".to_string(),
        endpoints: EndpointSet {
            production_url: "http://production.invalid/transactions/create".to_string(),
            sandbox_url: "http://sandbox.invalid/transactions/create".to_string(),
        },
        default_currency: Currency::usd(),
        gateway_timeout: Duration::from_secs(15),
        engine_timeout: Duration::from_secs(15),
        site_name: Some("Acme Print".to_string()),
        site_type: Some("Dev".to_string()),
    }
}

pub fn transaction_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 6, 5).unwrap()
}

#[derive(Default)]
pub struct InMemoryGateway {
    orders: HashMap<String, ChargeSet>,
    pub calls: AtomicUsize,
}

impl InMemoryGateway {
    pub fn with(mut self, charges: ChargeSet) -> Self {
        self.orders.insert(charges.order_id().to_string(), charges);
        self
    }
}

#[async_trait]
impl OrderChargesGateway for InMemoryGateway {
    async fn fetch(&self, order_id: &str) -> Result<ChargeSet, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(order_id.to_string()))
    }
}

pub struct FailingGateway(pub GatewayError);

#[async_trait]
impl OrderChargesGateway for FailingGateway {
    async fn fetch(&self, _order_id: &str) -> Result<ChargeSet, GatewayError> {
        Err(self.0.clone())
    }
}

/// Never answers; used with paused time to exercise timeouts and cancellation
pub struct StalledGateway;

#[async_trait]
impl OrderChargesGateway for StalledGateway {
    async fn fetch(&self, _order_id: &str) -> Result<ChargeSet, GatewayError> {
        std::future::pending().await
    }
}

pub enum Script {
    Fixed(Decimal),
    /// Tax as a fraction of the sum of all lines
    Rate(Decimal),
    Fail(EngineError),
    Stall,
}

pub struct ScriptedEngine {
    script: Script,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<TaxRequest>>,
    pub endpoints: Mutex<Vec<EngineEndpoint>>,
}

impl ScriptedEngine {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            endpoints: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaxEngineClient for ScriptedEngine {
    async fn compute_tax(
        &self,
        request: &TaxRequest,
        _credentials: &Credentials,
        endpoint: &EngineEndpoint,
    ) -> Result<TaxResult, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.endpoints.lock().unwrap().push(endpoint.clone());

        let amount = match &self.script {
            Script::Fixed(amount) => *amount,
            Script::Rate(rate) => {
                let base: Decimal = request.lines().iter().map(|l| l.amount.amount()).sum();
                (base * rate).round_dp(2)
            }
            Script::Fail(error) => return Err(error.clone()),
            Script::Stall => std::future::pending().await,
        };

        Ok(TaxResult {
            total_tax: Money::new(amount, request.currency().clone()).unwrap(),
        })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<TaxFailureEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<TaxFailureEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: TaxFailureEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn georgia() -> Arc<RegionSetPolicy> {
    Arc::new(RegionSetPolicy::new([TaxableRegion {
        code: "GA".to_string(),
        aliases: vec!["Georgia".to_string()],
    }]))
}

pub fn orchestrator(
    gateway: Arc<dyn OrderChargesGateway>,
    engine: Arc<ScriptedEngine>,
    notifier: Arc<RecordingNotifier>,
    settings: TaxSettings,
) -> TaxOrchestrator {
    TaxOrchestrator::new(gateway, georgia(), engine, notifier, settings).with_clock(transaction_date)
}
