pub mod models;
pub mod pii;

pub use models::events::{FailureKind, Severity, TaxFailureEvent};
pub use pii::Masked;
