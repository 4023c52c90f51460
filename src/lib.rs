pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::toml_config::TomlConfig;

pub use adapters::{
    file_store::JsonFileStore, http::HttpHealthStore, storage::LocalStorage, StoreBackend,
};
pub use core::{csv_parser::CsvParser, engine::ImportEngine, importer::HealthDataImporter};
pub use domain::model::{BodyCompositionRecord, DerivedMetricEntry, ImportOutcome, MetricKind};
pub use utils::error::{ImportError, Result};
