//! Single-flight execution of collection jobs.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use super::{CollaboratorError, DataCollector, GuardState, JobGuard};
use crate::errors::AppError;
use crate::models::{JobOutcome, JobParams, JobStatus};

/// Runs the external collector behind the job guard.
pub struct JobOrchestrator {
    guard: Arc<JobGuard>,
    collector: Arc<dyn DataCollector>,
    timeout: Option<Duration>,
}

impl JobOrchestrator {
    pub fn new(collector: Arc<dyn DataCollector>, timeout: Option<Duration>) -> Self {
        Self {
            guard: Arc::new(JobGuard::new()),
            collector,
            timeout,
        }
    }

    /// Run one collection job, or fail with `JobInProgress` if one is running.
    ///
    /// The admitted job runs on its own task and keeps the slot until the
    /// collector finishes, even if the caller stops waiting.
    pub async fn run(&self, params: JobParams) -> Result<JobOutcome, AppError> {
        let Some(permit) = self.guard.try_acquire() else {
            tracing::warn!(
                "Collection job rejected (product limit {}): another job is in progress",
                params.product_limit
            );
            return Err(AppError::JobInProgress);
        };

        let collector = self.collector.clone();
        let timeout = self.timeout;
        let job = tokio::spawn(async move {
            let _permit = permit;
            collect(collector, timeout, params).await
        });

        job.await.map_err(|e| {
            tracing::error!("Collection job task failed: {}", e);
            AppError::Internal(format!("Collection job task failed: {}", e))
        })?
    }

    pub fn status(&self) -> JobStatus {
        let (state, finished_jobs) = self.guard.snapshot();
        JobStatus {
            running: state == GuardState::Locked,
            finished_jobs,
        }
    }
}

async fn collect(
    collector: Arc<dyn DataCollector>,
    timeout: Option<Duration>,
    params: JobParams,
) -> Result<JobOutcome, AppError> {
    let job_id = Uuid::new_v4();
    let started_at = Utc::now();
    tracing::info!(
        "Collection job {} started (product limit {})",
        job_id,
        params.product_limit
    );

    let collecting = collector.begin_collecting(&params);
    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, collecting)
            .await
            .unwrap_or(Err(CollaboratorError::TimedOut(limit))),
        None => collecting.await,
    };

    match result {
        Ok(report) => {
            tracing::info!(
                "Collection job {} finished: {} products inserted",
                job_id,
                report.inserted_products
            );
            Ok(JobOutcome {
                job_id,
                product_limit: params.product_limit,
                started_at,
                finished_at: Utc::now(),
                report,
            })
        }
        Err(e) => {
            tracing::error!("Collection job {} failed: {}", job_id, e);
            Err(AppError::CollectorFailed {
                cause: e.to_string(),
            })
        }
    }
}
