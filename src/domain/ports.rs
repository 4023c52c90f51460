use crate::domain::model::{DerivedMetricEntry, MetricKind};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// External store that accepts derived health entries.
///
/// Authorization is the store's concern; the importer only calls
/// `insert_batch` once per import.
#[async_trait]
pub trait HealthStore: Send + Sync {
    async fn ensure_authorized(&self) -> Result<()>;
    async fn insert_batch(&self, entries: &[DerivedMetricEntry]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Http,
    File,
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn sink(&self) -> SinkKind;
    fn endpoint(&self) -> Option<&str>;
    fn access_token(&self) -> Option<&str>;
    fn timeout_seconds(&self) -> u64;
    fn output_path(&self) -> &str;
    fn file_name(&self) -> &str;
}

/// Read and write permissions for every metric the importer produces.
pub fn required_permissions() -> Vec<String> {
    MetricKind::ALL
        .iter()
        .flat_map(|kind| [kind.write_permission(), kind.read_permission()])
        .collect()
}
