//! Document store module.
//!
//! The remote document store is the source of truth for all category data.
//! Every document carries a revision token; writes must name the revision they
//! were based on and the store rejects stale ones.

mod couch;
#[cfg(test)]
mod memory;
mod sqlite;

pub use couch::*;
#[cfg(test)]
pub use memory::*;
pub use sqlite::*;

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Config, StoreBackend};

/// Failures reported by a document store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,

    #[error("document revision conflict")]
    Conflict,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed store response: {0}")]
    Malformed(String),
}

/// A raw document as held by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub rev: String,
    /// Document body without the id or revision metadata.
    pub body: serde_json::Value,
}

/// Ordering and paging for [`DocumentStore::list`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub descending: bool,
    pub limit: Option<usize>,
}

impl ListOptions {
    /// All documents in ascending id order.
    pub fn all() -> Self {
        Self::default()
    }

    /// Only the document with the greatest id.
    pub fn last() -> Self {
        Self {
            descending: true,
            limit: Some(1),
        }
    }
}

/// Typed interface over a revision-tracked document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document.
    async fn get(&self, id: &str) -> Result<StoredDocument, StoreError>;

    /// Fetch documents ordered by [`compare_ids`].
    async fn list(&self, options: ListOptions) -> Result<Vec<StoredDocument>, StoreError>;

    /// Create (`rev == None`) or update a document and return its new revision.
    async fn put(
        &self,
        id: &str,
        rev: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<String, StoreError>;

    /// Delete the document at the given revision.
    async fn delete(&self, id: &str, rev: &str) -> Result<(), StoreError>;
}

/// Open the backend selected by the configuration.
pub async fn init_store(config: &Config) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match &config.store {
        StoreBackend::Couch {
            url,
            username,
            password,
        } => {
            tracing::info!("Using CouchDB document store at {}", url);
            let store = CouchStore::new(
                url,
                username.clone(),
                password.clone(),
                config.store_timeout,
            )?;
            Ok(Arc::new(store))
        }
        StoreBackend::Sqlite { path } => {
            tracing::info!("Using SQLite document store at {:?}", path);
            Ok(Arc::new(SqliteStore::open(path).await?))
        }
    }
}

/// Id collation shared by all backends.
///
/// All-digit ids compare numerically and sort before every other id; the rest
/// compare lexically.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (is_numeric_id(a), is_numeric_id(b)) {
        (true, true) => {
            let (ta, tb) = (a.trim_start_matches('0'), b.trim_start_matches('0'));
            ta.len()
                .cmp(&tb.len())
                .then_with(|| ta.cmp(tb))
                .then_with(|| a.cmp(b))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

fn is_numeric_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// Sort and page documents according to the list options.
pub(crate) fn apply_list_options(docs: &mut Vec<StoredDocument>, options: ListOptions) {
    docs.sort_by(|a, b| compare_ids(&a.id, &b.id));
    if options.descending {
        docs.reverse();
    }
    if let Some(limit) = options.limit {
        docs.truncate(limit);
    }
}

/// Sort and page bare ids according to the list options.
pub(crate) fn page_ids(ids: &mut Vec<String>, options: ListOptions) {
    ids.sort_by(|a, b| compare_ids(a, b));
    if options.descending {
        ids.reverse();
    }
    if let Some(limit) = options.limit {
        ids.truncate(limit);
    }
}

/// Compute the revision token that follows `previous`.
pub(crate) fn next_revision(previous: Option<&str>) -> String {
    let generation = previous
        .and_then(|rev| rev.split_once('-'))
        .and_then(|(generation, _)| generation.parse::<u64>().ok())
        .unwrap_or(0);
    format!("{}-{}", generation + 1, uuid::Uuid::new_v4().simple())
}
