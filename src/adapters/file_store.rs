use crate::domain::model::DerivedMetricEntry;
use crate::domain::ports::{HealthStore, Storage};
use crate::utils::error::{ImportError, Result};
use async_trait::async_trait;

/// Offline health store: keeps every submitted entry in one JSON array file.
pub struct JsonFileStore<S: Storage> {
    storage: S,
    file_name: String,
}

impl<S: Storage> JsonFileStore<S> {
    pub fn new(storage: S, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
        }
    }

    pub async fn load_entries(&self) -> Result<Vec<DerivedMetricEntry>> {
        match self.storage.read_file(&self.file_name).await {
            Ok(data) if data.is_empty() => Ok(Vec::new()),
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(ImportError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl<S: Storage> HealthStore for JsonFileStore<S> {
    async fn ensure_authorized(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_batch(&self, entries: &[DerivedMetricEntry]) -> Result<()> {
        let mut stored = self.load_entries().await?;
        stored.extend_from_slice(entries);

        let json_data = serde_json::to_vec_pretty(&stored)?;
        self.storage.write_file(&self.file_name, &json_data).await?;

        tracing::info!(
            "📁 Wrote {} entries to {} ({} total)",
            entries.len(),
            self.file_name,
            stored.len()
        );
        Ok(())
    }
}
