use levy_core::{Credentials, Currency, FanoutNotifier, LogNotifier, Notifier, RegionSetPolicy};
use levy_order::{TaxOrchestrator, TaxSettings};
use levy_store::{Config, DbClient, HttpTaxEngineClient, KafkaNotifier, PgOrderChargesGateway};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<TaxOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: TaxOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Wire the production adapters from configuration.
    ///
    /// A bad tax engine environment does not stop startup: every order fails open with an
    /// alert until it is fixed, so checkout keeps working.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let engine_config = &config.tax_engine;
        let settings = TaxSettings {
            company_code: engine_config.company_code.clone(),
            customer_code: engine_config.customer_code.clone(),
            credentials: Credentials::new(engine_config.user_id.clone(), engine_config.password.expose().clone()),
            environment: engine_config.environment.clone(),
            endpoints: engine_config.endpoints(),
            default_currency: Currency::new(&engine_config.currency)?,
            gateway_timeout: config.gateway.timeout(),
            engine_timeout: engine_config.timeout(),
            site_name: config.site.name.clone(),
            site_type: config.site.site_type.clone(),
        };
        check_settings(&settings);

        let policy = RegionSetPolicy::new(config.jurisdiction.taxable_regions.iter().cloned());
        if policy.is_empty() {
            tracing::warn!("No taxable regions configured; every order will skip tax");
        }

        let db = DbClient::new_lazy(&config.database)?;
        let gateway = PgOrderChargesGateway::new(db.pool);
        let engine = HttpTaxEngineClient::new(engine_config.timeout())?;

        let mut notifier = FanoutNotifier::default().with(Arc::new(LogNotifier));
        if let Some(kafka) = &config.kafka {
            let producer = KafkaNotifier::new(&kafka.brokers, &kafka.failure_topic)?;
            tracing::info!("Publishing tax failures to Kafka topic {}", kafka.failure_topic);
            notifier = notifier.with(Arc::new(producer));
        }
        let notifier: Arc<dyn Notifier> = Arc::new(notifier);

        let orchestrator = TaxOrchestrator::new(
            Arc::new(gateway),
            Arc::new(policy),
            Arc::new(engine),
            notifier,
            settings,
        );
        Ok(Self::new(orchestrator))
    }
}

/// Log configuration defects once at startup; the per-order checks still fail open
fn check_settings(settings: &TaxSettings) {
    match settings.endpoints.resolve(&settings.environment) {
        Ok(endpoint) => tracing::info!("Tax engine environment {} at {}", endpoint.environment, endpoint.url),
        Err(e) => tracing::error!("{}; tax will fail open on every order", e),
    }
    if let Err(e) = settings.credentials.basic_auth_value() {
        tracing::error!("{}; tax will fail open on every order", e);
    }
}
