//! External collaborators: collector, link parser, spreadsheet importer and
//! product updater.
//!
//! Their internals live in a separate service; this module only defines the
//! narrow interfaces the admin backend calls and an HTTP client for them.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::models::{CollectionReport, JobParams};

/// Failures reported by an external collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("collector service is not configured")]
    NotConfigured,

    #[error("collector service unreachable: {0}")]
    Transport(String),

    #[error("collector service rejected the request: {0}")]
    Rejected(String),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(err: reqwest::Error) -> Self {
        CollaboratorError::Transport(err.to_string())
    }
}

/// Walks the storefront from the root category and inserts products.
#[async_trait]
pub trait DataCollector: Send + Sync {
    async fn begin_collecting(&self, params: &JobParams)
        -> Result<CollectionReport, CollaboratorError>;
}

/// Resolves a storefront link to its product group.
#[async_trait]
pub trait LinkParser: Send + Sync {
    async fn parse_link(&self, url: &str) -> Result<u64, CollaboratorError>;
}

/// Imports category rows from the maintained spreadsheet.
#[async_trait]
pub trait ExcelImporter: Send + Sync {
    async fn parse_excel_and_insert(&self) -> Result<(), CollaboratorError>;
}

/// Refreshes already imported products.
#[async_trait]
pub trait ProductUpdater: Send + Sync {
    async fn init_updater(&self) -> Result<(), CollaboratorError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParseLinkResponse {
    product_group_id: u64,
}

/// HTTP client for the external collector service.
#[derive(Clone)]
pub struct CollectorService {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl CollectorService {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
        }
    }

    fn url(&self, path: &str) -> Result<String, CollaboratorError> {
        self.base_url
            .as_ref()
            .map(|base| format!("{}{}", base, path))
            .ok_or(CollaboratorError::NotConfigured)
    }
}

/// Turn a non-success status into `Rejected` with the service's message.
async fn accepted(resp: reqwest::Response) -> Result<reqwest::Response, CollaboratorError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(CollaboratorError::Rejected(format!("{} {}", status, body.trim())))
}

#[async_trait]
impl DataCollector for CollectorService {
    async fn begin_collecting(
        &self,
        params: &JobParams,
    ) -> Result<CollectionReport, CollaboratorError> {
        let resp = self
            .client
            .post(self.url("/collect")?)
            .json(&json!({ "productLimit": params.product_limit }))
            .send()
            .await?;
        let report = accepted(resp)
            .await?
            .json::<CollectionReport>()
            .await
            .map_err(|e| CollaboratorError::Rejected(format!("unreadable report: {}", e)))?;
        Ok(report)
    }
}

#[async_trait]
impl LinkParser for CollectorService {
    async fn parse_link(&self, url: &str) -> Result<u64, CollaboratorError> {
        let resp = self
            .client
            .get(self.url("/links/parse")?)
            .query(&[("url", url)])
            .send()
            .await?;
        let parsed = accepted(resp)
            .await?
            .json::<ParseLinkResponse>()
            .await
            .map_err(|e| CollaboratorError::Rejected(format!("unreadable link result: {}", e)))?;
        Ok(parsed.product_group_id)
    }
}

#[async_trait]
impl ExcelImporter for CollectorService {
    async fn parse_excel_and_insert(&self) -> Result<(), CollaboratorError> {
        let resp = self.client.post(self.url("/excel/import")?).send().await?;
        accepted(resp).await?;
        Ok(())
    }
}

#[async_trait]
impl ProductUpdater for CollectorService {
    async fn init_updater(&self) -> Result<(), CollaboratorError> {
        let resp = self.client.post(self.url("/products/update")?).send().await?;
        accepted(resp).await?;
        Ok(())
    }
}
