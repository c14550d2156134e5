//! Collection job endpoints.

use axum::extract::{Query, State};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{JobOutcome, JobParams, JobStatus, StartJobQuery};
use crate::AppState;

/// Parse the `product-limit` query value into job parameters.
pub fn parse_job_params(query: &StartJobQuery) -> Result<JobParams, AppError> {
    let raw = query
        .product_limit
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation("product-limit is required".to_string()))?;

    let product_limit = raw.parse::<u32>().map_err(|_| {
        AppError::Validation(format!(
            "product-limit must be a non-negative integer, got '{}'",
            raw
        ))
    })?;

    Ok(JobParams { product_limit })
}

/// POST /api/jobs/collect?product-limit=N - Run one collection job.
///
/// Responds once the job has finished. A second request while one is
/// running is refused immediately with `JOB_IN_PROGRESS`.
pub async fn start_collection(
    State(state): State<AppState>,
    Query(query): Query<StartJobQuery>,
) -> ApiResult<JobOutcome> {
    let params = parse_job_params(&query)?;
    success(state.jobs.run(params).await?)
}

/// GET /api/jobs/status - Report whether a job holds the slot.
pub async fn job_status(State(state): State<AppState>) -> ApiResult<JobStatus> {
    success(state.jobs.status())
}
