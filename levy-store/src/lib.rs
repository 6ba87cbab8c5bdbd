pub mod app_config;
pub mod charges_repo;
pub mod database;
pub mod events;
pub mod tax_engine;

pub use app_config::Config;
pub use charges_repo::PgOrderChargesGateway;
pub use database::DbClient;
pub use events::KafkaNotifier;
pub use tax_engine::HttpTaxEngineClient;
