//! In-memory document store used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{apply_list_options, next_revision, DocumentStore, ListOptions, StoreError, StoredDocument};

#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, (String, serde_json::Value)>>,
    unavailable: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the store were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of successful writes (puts and deletes).
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Insert a raw document, bypassing revision checks.
    pub fn seed(&self, id: &str, body: serde_json::Value) -> String {
        let rev = next_revision(None);
        self.docs
            .lock()
            .unwrap()
            .insert(id.to_string(), (rev.clone(), body));
        rev
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<StoredDocument, StoreError> {
        self.check_available()?;
        let docs = self.docs.lock().unwrap();
        docs.get(id)
            .map(|(rev, body)| StoredDocument {
                id: id.to_string(),
                rev: rev.clone(),
                body: body.clone(),
            })
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, options: ListOptions) -> Result<Vec<StoredDocument>, StoreError> {
        self.check_available()?;
        let mut out: Vec<_> = self
            .docs
            .lock()
            .unwrap()
            .iter()
            .map(|(id, (rev, body))| StoredDocument {
                id: id.clone(),
                rev: rev.clone(),
                body: body.clone(),
            })
            .collect();
        apply_list_options(&mut out, options);
        Ok(out)
    }

    async fn put(
        &self,
        id: &str,
        rev: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<String, StoreError> {
        self.check_available()?;
        let mut docs = self.docs.lock().unwrap();
        match (docs.get(id), rev) {
            (Some(_), None) => return Err(StoreError::Conflict),
            (None, Some(_)) => return Err(StoreError::NotFound),
            (Some((current, _)), Some(expected)) if current != expected => {
                return Err(StoreError::Conflict)
            }
            _ => {}
        }
        let new_rev = next_revision(rev);
        docs.insert(id.to_string(), (new_rev.clone(), body.clone()));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(new_rev)
    }

    async fn delete(&self, id: &str, rev: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let mut docs = self.docs.lock().unwrap();
        match docs.get(id) {
            None => Err(StoreError::NotFound),
            Some((current, _)) if current != rev => Err(StoreError::Conflict),
            Some(_) => {
                docs.remove(id);
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }
}
