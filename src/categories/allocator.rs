//! Sequential id allocation for new categories.

use std::sync::Arc;

use crate::errors::AppError;
use crate::store::{DocumentStore, ListOptions};

/// Id handed out when the store holds no categories yet.
const FIRST_ID: u64 = 1;

/// Derives the next category id from the greatest id currently stored.
///
/// Allocation does not reserve anything. Two callers that read the same
/// maximum get the same id; the store rejects the second create with a
/// conflict and that caller has to allocate again.
#[derive(Clone)]
pub struct SequentialIdAllocator {
    store: Arc<dyn DocumentStore>,
}

impl SequentialIdAllocator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Return `max_id + 1` as a decimal string.
    pub async fn next_id(&self) -> Result<String, AppError> {
        let last = self.store.list(ListOptions::last()).await?;

        let Some(doc) = last.into_iter().next() else {
            tracing::debug!("No categories stored, starting at {}", FIRST_ID);
            return Ok(FIRST_ID.to_string());
        };

        let current: u64 = doc.id.parse().map_err(|_| {
            AppError::AllocationParse(format!(
                "Current maximum category id {:?} is not an integer",
                doc.id
            ))
        })?;

        let next = current.checked_add(1).ok_or_else(|| {
            AppError::AllocationParse(format!("Category id {} cannot be incremented", current))
        })?;

        Ok(next.to_string())
    }
}
