pub mod orchestrator;
pub mod request_builder;

pub use orchestrator::{TaxComputation, TaxOrchestrator, TaxOutcome, TaxSettings};
