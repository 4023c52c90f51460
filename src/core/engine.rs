use crate::core::csv_parser::CsvParser;
use crate::core::importer::HealthDataImporter;
use crate::domain::model::ImportOutcome;
use crate::domain::ports::{HealthStore, Storage};
use crate::utils::error::{ImportError, Result};
use crate::utils::monitor::SystemMonitor;

/// Reads a CSV file through `Storage` and imports it into a `HealthStore`.
pub struct ImportEngine<S: Storage, H: HealthStore> {
    storage: S,
    parser: CsvParser,
    importer: HealthDataImporter<H>,
    monitor: SystemMonitor,
}

impl<S: Storage, H: HealthStore> ImportEngine<S, H> {
    pub fn new(storage: S, store: H) -> Self {
        Self::new_with_monitoring(storage, store, false)
    }

    pub fn new_with_monitoring(storage: S, store: H, monitor_enabled: bool) -> Self {
        Self {
            storage,
            parser: CsvParser::new(),
            importer: HealthDataImporter::new(store),
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self, input_path: &str) -> Result<ImportOutcome> {
        tracing::info!("Starting import of {}", input_path);
        self.monitor.log_stats("Start");

        // 先確認權限，未授權就不讀檔
        self.importer.store().ensure_authorized().await?;

        let data = self.storage.read_file(input_path).await?;
        tracing::debug!("Read {} bytes from {}", data.len(), input_path);

        let (records, summary) = self.parser.parse_with_summary(data.as_slice());
        tracing::info!(
            "Parsed {} records ({} rows, {} skipped)",
            records.len(),
            summary.rows_seen,
            summary.skipped()
        );
        tracing::debug!("Parse summary: {:?}", summary);
        self.monitor.log_stats("Parsing");

        if records.is_empty() {
            return Err(ImportError::NoValidRecords {
                path: input_path.to_string(),
            });
        }

        let outcome = self.importer.import(&records).await;
        self.monitor.log_stats("Import");
        self.monitor.log_final_stats();

        if outcome.is_success {
            tracing::info!(
                "Imported {}/{} records ({} failed)",
                outcome.successful_records,
                outcome.total_records,
                outcome.failed_records
            );
        } else {
            tracing::error!("Import of {} failed", input_path);
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::DerivedMetricEntry;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn with_file(path: &str, content: &str) -> Self {
            let storage = Self::default();
            storage
                .files
                .lock()
                .await
                .insert(path.to_string(), content.as_bytes().to_vec());
            storage
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                ImportError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct CountingStore {
        authorized: bool,
        inserted: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl HealthStore for CountingStore {
        async fn ensure_authorized(&self) -> Result<()> {
            if self.authorized {
                Ok(())
            } else {
                Err(ImportError::PermissionDenied {
                    missing: vec!["WRITE_WEIGHT".to_string()],
                })
            }
        }

        async fn insert_batch(&self, entries: &[DerivedMetricEntry]) -> Result<()> {
            self.inserted.fetch_add(entries.len(), Ordering::SeqCst);
            Ok(())
        }
    }

    const CSV: &str = "time,weight,height,bmi,fatRate,bodyWaterRate,boneMass,metabolism,muscleRate,visceralFat
2024-04-29 12:12:32+0000,77.8,170.0,26.9,25.966814,50.786766,2.9319906,1564.0,54.66583,12.0
2024-04-29 12:21:07+0000,75.0,170.0,25.9,null,null,null,null,null,null
,75.0,170.0,25.9,null,null,null,null,null,null
";

    #[tokio::test]
    async fn test_run_imports_valid_rows() {
        let storage = MockStorage::with_file("body.csv", CSV).await;
        let store = CountingStore {
            authorized: true,
            ..Default::default()
        };
        let engine = ImportEngine::new(storage, store.clone());

        let outcome = engine.run("body.csv").await.unwrap();

        assert!(outcome.is_success);
        assert_eq!(outcome.total_records, 2);
        assert_eq!(outcome.successful_records, 2);
        assert_eq!(store.inserted.load(Ordering::SeqCst), 12);
    }

    #[tokio::test]
    async fn test_run_without_permission_does_not_insert() {
        let storage = MockStorage::with_file("body.csv", CSV).await;
        let store = CountingStore::default();
        let engine = ImportEngine::new(storage, store.clone());

        let err = engine.run("body.csv").await.unwrap_err();

        assert!(matches!(err, ImportError::PermissionDenied { .. }));
        assert_eq!(store.inserted.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_with_no_valid_rows() {
        let storage = MockStorage::with_file(
            "empty.csv",
            "time,weight,height\n2024-04-29 12:12:32+0000,77.8\n",
        )
        .await;
        let store = CountingStore {
            authorized: true,
            ..Default::default()
        };
        let engine = ImportEngine::new(storage, store.clone());

        let err = engine.run("empty.csv").await.unwrap_err();

        assert!(matches!(err, ImportError::NoValidRecords { ref path } if path == "empty.csv"));
        assert_eq!(store.inserted.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_missing_file() {
        let store = CountingStore {
            authorized: true,
            ..Default::default()
        };
        let engine = ImportEngine::new(MockStorage::default(), store);

        let err = engine.run("missing.csv").await.unwrap_err();
        assert!(matches!(err, ImportError::IoError(_)));
    }
}
