//! CouchDB document store client.
//!
//! Talks to a single database over HTTP. Revision semantics are CouchDB's own;
//! this module only translates statuses into [`StoreError`] kinds.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{page_ids, DocumentStore, ListOptions, StoreError, StoredDocument};

/// Prefix of CouchDB design documents, which are never category data.
const DESIGN_PREFIX: &str = "_design/";

/// HTTP client for one CouchDB database.
#[derive(Clone)]
pub struct CouchStore {
    client: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AllDocsResponse {
    rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
struct AllDocsRow {
    key: String,
    #[serde(default)]
    doc: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    rev: String,
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Malformed(err.to_string())
        } else {
            StoreError::Unavailable(err.to_string())
        }
    }
}

impl CouchStore {
    /// `base_url` points at the database, e.g. `http://localhost:5984/categories`.
    pub fn new(
        base_url: &str,
        username: Option<String>,
        password: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
        })
    }

    fn doc_url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(id))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_ref()),
            None => builder,
        }
    }

    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        let resp = self.request(Method::HEAD, &self.doc_url(id)).send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            s => Err(unexpected(s)),
        }
    }

    /// Resolve a 409 on a revisioned write.
    ///
    /// CouchDB also answers 409 when the document is missing or its leaf
    /// revision is a tombstone; `HEAD` reports 404 for both.
    async fn conflict_or_missing(&self, id: &str) -> StoreError {
        match self.exists(id).await {
            Ok(true) => StoreError::Conflict,
            Ok(false) => StoreError::NotFound,
            Err(e) => e,
        }
    }
}

fn unexpected(status: StatusCode) -> StoreError {
    StoreError::Unavailable(format!("unexpected CouchDB status {}", status))
}

/// Split CouchDB metadata (`_id`, `_rev`, ...) from the document body.
fn into_stored(value: Value) -> Result<StoredDocument, StoreError> {
    let Value::Object(mut obj) = value else {
        return Err(StoreError::Malformed("document is not an object".to_string()));
    };
    let id = match obj.remove("_id") {
        Some(Value::String(id)) => id,
        _ => return Err(StoreError::Malformed("document without _id".to_string())),
    };
    let rev = match obj.remove("_rev") {
        Some(Value::String(rev)) => rev,
        _ => return Err(StoreError::Malformed(format!("document {} without _rev", id))),
    };
    obj.retain(|key, _| !key.starts_with('_'));
    Ok(StoredDocument {
        id,
        rev,
        body: Value::Object(obj),
    })
}

#[async_trait]
impl DocumentStore for CouchStore {
    async fn get(&self, id: &str) -> Result<StoredDocument, StoreError> {
        let resp = self.request(Method::GET, &self.doc_url(id)).send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound),
            s if s.is_success() => into_stored(resp.json().await?),
            s => Err(unexpected(s)),
        }
    }

    async fn list(&self, options: ListOptions) -> Result<Vec<StoredDocument>, StoreError> {
        // Keys first: _all_docs collates ids as strings, so ordering and
        // paging happen here before the documents themselves are fetched.
        let url = format!("{}/_all_docs", self.base_url);
        let resp = self.request(Method::GET, &url).send().await?;
        if !resp.status().is_success() {
            return Err(unexpected(resp.status()));
        }
        let keys: AllDocsResponse = resp.json().await?;

        let mut ids: Vec<String> = keys
            .rows
            .into_iter()
            .map(|row| row.key)
            .filter(|id| !id.starts_with(DESIGN_PREFIX))
            .collect();
        page_ids(&mut ids, options);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let resp = self
            .request(Method::POST, &url)
            .query(&[("include_docs", "true")])
            .json(&json!({ "keys": ids }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(unexpected(resp.status()));
        }
        let docs: AllDocsResponse = resp.json().await?;

        // Rows deleted between the two requests come back without a document.
        docs.rows
            .into_iter()
            .filter_map(|row| row.doc.filter(|doc| !doc.is_null()))
            .map(into_stored)
            .collect()
    }

    async fn put(
        &self,
        id: &str,
        rev: Option<&str>,
        body: &Value,
    ) -> Result<String, StoreError> {
        let mut payload = body.clone();
        if let (Some(rev), Some(obj)) = (rev, payload.as_object_mut()) {
            obj.insert("_rev".to_string(), Value::String(rev.to_string()));
        }

        let resp = self
            .request(Method::PUT, &self.doc_url(id))
            .json(&payload)
            .send()
            .await?;

        match resp.status() {
            StatusCode::CONFLICT if rev.is_some() => Err(self.conflict_or_missing(id).await),
            StatusCode::CONFLICT => Err(StoreError::Conflict),
            s if s.is_success() => {
                let written: WriteResponse = resp.json().await?;
                Ok(written.rev)
            }
            s => Err(unexpected(s)),
        }
    }

    async fn delete(&self, id: &str, rev: &str) -> Result<(), StoreError> {
        let resp = self
            .request(Method::DELETE, &self.doc_url(id))
            .query(&[("rev", rev)])
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound),
            StatusCode::CONFLICT => Err(self.conflict_or_missing(id).await),
            s if s.is_success() => Ok(()),
            s => Err(unexpected(s)),
        }
    }
}
