pub mod csv_parser;
pub mod engine;
pub mod importer;

pub use crate::domain::model::{BodyCompositionRecord, DerivedMetricEntry, ImportOutcome};
pub use crate::domain::ports::{ConfigProvider, HealthStore, Storage};
pub use crate::utils::error::Result;
