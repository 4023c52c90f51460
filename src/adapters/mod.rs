// Adapters layer: concrete implementations for external systems (storage, health store backends).

pub mod file_store;
pub mod http;
pub mod storage;

use crate::domain::model::DerivedMetricEntry;
use crate::domain::ports::{ConfigProvider, HealthStore, SinkKind};
use crate::utils::error::{ImportError, Result};
use async_trait::async_trait;
use std::time::Duration;

use self::file_store::JsonFileStore;
use self::http::HttpHealthStore;
use self::storage::LocalStorage;

/// Health store selected at runtime from configuration.
pub enum StoreBackend {
    Http(HttpHealthStore),
    File(JsonFileStore<LocalStorage>),
}

impl StoreBackend {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        match config.sink() {
            SinkKind::Http => {
                let endpoint = config.endpoint().ok_or_else(|| ImportError::MissingConfigError {
                    field: "endpoint".to_string(),
                })?;
                let store = HttpHealthStore::new(
                    endpoint,
                    config.access_token().map(str::to_string),
                    Duration::from_secs(config.timeout_seconds()),
                )?;
                Ok(StoreBackend::Http(store))
            }
            SinkKind::File => Ok(StoreBackend::File(JsonFileStore::new(
                LocalStorage::new(config.output_path()),
                config.file_name(),
            ))),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            StoreBackend::Http(_) => "http",
            StoreBackend::File(_) => "file",
        }
    }
}

#[async_trait]
impl HealthStore for StoreBackend {
    async fn ensure_authorized(&self) -> Result<()> {
        match self {
            StoreBackend::Http(store) => store.ensure_authorized().await,
            StoreBackend::File(store) => store.ensure_authorized().await,
        }
    }

    async fn insert_batch(&self, entries: &[DerivedMetricEntry]) -> Result<()> {
        match self {
            StoreBackend::Http(store) => store.insert_batch(entries).await,
            StoreBackend::File(store) => store.insert_batch(entries).await,
        }
    }
}
