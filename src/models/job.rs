//! Collection job and collaborator models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Parameters handed to the external collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobParams {
    /// Maximum number of products to insert during the run
    pub product_limit: u32,
}

/// Query parameters accepted when starting a job.
#[derive(Debug, Deserialize)]
pub struct StartJobQuery {
    #[serde(rename = "product-limit")]
    pub product_limit: Option<String>,
}

/// Summary reported by the collector when a run finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionReport {
    #[serde(default)]
    pub inserted_products: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Successful outcome of one admitted job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub job_id: Uuid,
    pub product_limit: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub report: CollectionReport,
}

/// Current state of the job slot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub running: bool,
    /// Admitted jobs that have finished, successfully or not, since startup
    pub finished_jobs: u64,
}

/// Query parameters for link parsing.
#[derive(Debug, Deserialize)]
pub struct ParseLinkQuery {
    #[serde(default)]
    pub url: String,
}

/// Product group resolved from a storefront link.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedLink {
    pub url: String,
    pub product_group_id: u64,
}

/// Plain acknowledgement for collaborator calls without a payload.
#[derive(Debug, Clone, Serialize)]
pub struct Acknowledgement {
    pub message: String,
}
