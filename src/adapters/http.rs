use crate::domain::model::DerivedMetricEntry;
use crate::domain::ports::{required_permissions, HealthStore};
use crate::utils::error::{ImportError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct InsertRecordsRequest<'a> {
    records: &'a [DerivedMetricEntry],
}

#[derive(Debug, Deserialize)]
struct PermissionsResponse {
    #[serde(default)]
    granted: Vec<String>,
}

/// Health store reached over HTTP.
///
/// * `GET  {endpoint}/permissions` -> `{"granted": ["WRITE_WEIGHT", ...]}`
/// * `POST {endpoint}/records` with `{"records": [...]}`
pub struct HttpHealthStore {
    client: Client,
    endpoint: String,
    access_token: Option<String>,
}

impl HttpHealthStore {
    pub fn new(endpoint: &str, access_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl HealthStore for HttpHealthStore {
    async fn ensure_authorized(&self) -> Result<()> {
        let url = self.url("permissions");
        tracing::debug!("Checking health store permissions at {}", url);

        let response = self.authorize(self.client.get(&url)).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ImportError::PermissionDenied {
                missing: required_permissions(),
            });
        }
        if !status.is_success() {
            return Err(ImportError::HealthStoreRejected {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let granted: HashSet<String> = response
            .json::<PermissionsResponse>()
            .await?
            .granted
            .into_iter()
            .collect();
        let missing: Vec<String> = required_permissions()
            .into_iter()
            .filter(|permission| !granted.contains(permission))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ImportError::PermissionDenied { missing })
        }
    }

    async fn insert_batch(&self, entries: &[DerivedMetricEntry]) -> Result<()> {
        let url = self.url("records");
        tracing::debug!("Posting {} entries to {}", entries.len(), url);

        let response = self
            .authorize(self.client.post(&url))
            .json(&InsertRecordsRequest { records: entries })
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Health store response status: {}", status);

        if status.is_success() {
            Ok(())
        } else {
            Err(ImportError::HealthStoreRejected {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            })
        }
    }
}
