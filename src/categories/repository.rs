//! Category repository over the document store.
//!
//! Holds no lock and no cached copies: every mutation is one write whose
//! success is decided by the store's revision check.

use std::sync::Arc;

use super::{legacy_timestamp, Clock, SequentialIdAllocator};
use crate::errors::AppError;
use crate::models::{Category, CategoryDocument, CategoryFields};
use crate::store::{DocumentStore, ListOptions, StoredDocument};

/// Typed create/read/update/delete for category documents.
#[derive(Clone)]
pub struct CategoryRepository {
    store: Arc<dyn DocumentStore>,
    allocator: SequentialIdAllocator,
    clock: Arc<dyn Clock>,
}

impl CategoryRepository {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            allocator: SequentialIdAllocator::new(store.clone()),
            store,
            clock,
        }
    }

    /// Compute the id the next create would use.
    pub async fn next_id(&self) -> Result<String, AppError> {
        self.allocator.next_id().await
    }

    /// Get a category by ID.
    pub async fn get(&self, id: &str) -> Result<Category, AppError> {
        let doc = self
            .store
            .get(id)
            .await
            .map_err(|e| AppError::from_store(e, id))?;
        decode(doc)
    }

    /// List all categories in store order.
    pub async fn list(&self) -> Result<Vec<Category>, AppError> {
        let docs = self.store.list(ListOptions::all()).await?;
        docs.into_iter().map(decode).collect()
    }

    /// Create a category under a freshly allocated id.
    ///
    /// A `Conflict` means another create claimed the same id first; allocate
    /// again by calling `create` again.
    pub async fn create(&self, fields: CategoryFields) -> Result<Category, AppError> {
        let id = self.allocator.next_id().await?;
        let now = legacy_timestamp(&self.clock.now());
        let doc = CategoryDocument::new(&id, fields, now.clone(), now);

        let revision = self
            .store
            .put(&id, None, &encode(&doc)?)
            .await
            .map_err(|e| AppError::from_store(e, &id))?;

        tracing::info!("Category {} created (rev {})", id, revision);
        Ok(doc.into_category(revision))
    }

    /// Overwrite a category, provided `revision` is still current.
    pub async fn update(
        &self,
        id: &str,
        revision: &str,
        created_at: &str,
        fields: CategoryFields,
    ) -> Result<Category, AppError> {
        let now = legacy_timestamp(&self.clock.now());
        let doc = CategoryDocument::new(id, fields, created_at.to_string(), now);

        let new_revision = self
            .store
            .put(id, Some(revision), &encode(&doc)?)
            .await
            .map_err(|e| {
                tracing::warn!("Update of category {} at rev {} rejected: {}", id, revision, e);
                AppError::from_store(e, id)
            })?;

        tracing::info!("Category {} updated (rev {} -> {})", id, revision, new_revision);
        Ok(doc.into_category(new_revision))
    }

    /// Delete a category, provided `revision` is still current.
    pub async fn delete(&self, id: &str, revision: &str) -> Result<(), AppError> {
        self.store.delete(id, revision).await.map_err(|e| {
            tracing::warn!("Delete of category {} at rev {} rejected: {}", id, revision, e);
            AppError::from_store(e, id)
        })?;

        tracing::info!("Category {} deleted", id);
        Ok(())
    }
}

fn encode(doc: &CategoryDocument) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(doc)
        .map_err(|e| AppError::Internal(format!("Failed to encode category {}: {}", doc.id, e)))
}

fn decode(doc: StoredDocument) -> Result<Category, AppError> {
    let body: CategoryDocument = serde_json::from_value(doc.body).map_err(|e| {
        AppError::DecodeFailed(format!("Category {} has an unexpected shape: {}", doc.id, e))
    })?;

    if body.id != doc.id {
        return Err(AppError::DecodeFailed(format!(
            "Category stored under {} carries id {}",
            doc.id, body.id
        )));
    }

    Ok(body.into_category(doc.rev))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveDateTime};
    use serde_json::json;
    use tokio::sync::Barrier;

    use crate::store::{MemoryStore, StoreError};

    struct FixedClock(NaiveDateTime);

    impl Clock for FixedClock {
        fn now(&self) -> NaiveDateTime {
            self.0
        }
    }

    fn fixed_clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(
            NaiveDate::from_ymd_opt(2024, 3, 7)
                .unwrap()
                .and_hms_opt(14, 30, 5)
                .unwrap(),
        ))
    }

    fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            "1000",
            json!({ "id": "1000", "name": "Root", "parent_id": "", "sarga_id": "NULL" }),
        );
        store
    }

    fn baby_care() -> CategoryFields {
        CategoryFields {
            name: "Baby Care".to_string(),
            slug: "baby-care".to_string(),
            order: "3".to_string(),
            weight: "1".to_string(),
            parent_id: Some("1000".to_string()),
            external_ref: None,
        }
    }

    /// Holds every `list` call until two callers have read the store.
    struct GatedStore {
        inner: Arc<MemoryStore>,
        barrier: Barrier,
    }

    #[async_trait]
    impl DocumentStore for GatedStore {
        async fn get(&self, id: &str) -> Result<StoredDocument, StoreError> {
            self.inner.get(id).await
        }

        async fn list(&self, options: ListOptions) -> Result<Vec<StoredDocument>, StoreError> {
            let docs = self.inner.list(options).await;
            self.barrier.wait().await;
            docs
        }

        async fn put(
            &self,
            id: &str,
            rev: Option<&str>,
            body: &serde_json::Value,
        ) -> Result<String, StoreError> {
            self.inner.put(id, rev, body).await
        }

        async fn delete(&self, id: &str, rev: &str) -> Result<(), StoreError> {
            self.inner.delete(id, rev).await
        }
    }

    #[tokio::test]
    async fn test_create_allocates_next_id_and_stamps_times() {
        let repo = CategoryRepository::new(seeded_store(), fixed_clock());

        let created = repo.create(baby_care()).await.unwrap();

        assert_eq!(created.id, "1001");
        assert!(!created.revision.is_empty());
        assert_eq!(created.created_at, "2024-3-7 14:14:5");
        assert_eq!(created.updated_at, created.created_at);
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let repo = CategoryRepository::new(seeded_store(), fixed_clock());

        let created = repo.create(baby_care()).await.unwrap();
        let fetched = repo.get(&created.id).await.unwrap();

        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_concurrent_creates_conflict_then_retry() {
        let store = Arc::new(GatedStore {
            inner: seeded_store(),
            barrier: Barrier::new(2),
        });
        let repo = CategoryRepository::new(store.clone(), fixed_clock());

        let (first, second) = tokio::join!(repo.create(baby_care()), repo.create(baby_care()));
        let mut results = vec![first, second];
        results.sort_by_key(|r| r.is_err());

        assert_eq!(results[0].as_ref().unwrap().id, "1001");
        assert!(matches!(results[1], Err(AppError::Conflict(_))));

        // Retrying the losing create allocates past the winner.
        let barrier_free = CategoryRepository::new(store.inner.clone(), fixed_clock());
        let retried = barrier_free.create(baby_care()).await.unwrap();
        assert_eq!(retried.id, "1002");
    }

    #[tokio::test]
    async fn test_update_with_current_revision() {
        let repo = CategoryRepository::new(seeded_store(), fixed_clock());
        let created = repo.create(baby_care()).await.unwrap();

        let mut fields = baby_care();
        fields.name = "Baby & Toddler".to_string();
        let updated = repo
            .update(&created.id, &created.revision, &created.created_at, fields)
            .await
            .unwrap();

        assert_eq!(updated.name, "Baby & Toddler");
        assert_ne!(updated.revision, created.revision);
        assert_eq!(repo.get(&created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_stale_update_conflicts_without_mutation() {
        let store = seeded_store();
        let repo = CategoryRepository::new(store.clone(), fixed_clock());
        let created = repo.create(baby_care()).await.unwrap();
        repo.update(&created.id, &created.revision, &created.created_at, baby_care())
            .await
            .unwrap();
        let before = repo.get(&created.id).await.unwrap();
        let writes = store.writes();

        let mut fields = baby_care();
        fields.name = "Lost update".to_string();
        let err = repo
            .update(&created.id, &created.revision, &created.created_at, fields)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.writes(), writes);
        assert_eq!(repo.get(&created.id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_update_missing_category_is_not_found() {
        let repo = CategoryRepository::new(seeded_store(), fixed_clock());
        let err = repo
            .update("77", "1-abc", "2024-1-1 1:1:0", baby_care())
            .await
            .unwrap_err();
        assert_eq!(err, AppError::NotFound("Category 77 not found".to_string()));
    }

    #[tokio::test]
    async fn test_delete_with_stale_revision_conflicts() {
        let store = Arc::new(MemoryStore::new());
        store.seed("42", json!({ "id": "42", "name": "Garden" }));
        let repo = CategoryRepository::new(store.clone(), fixed_clock());
        let current = repo.get("42").await.unwrap();
        repo.update("42", &current.revision, &current.created_at, baby_care())
            .await
            .unwrap();
        let latest = repo.get("42").await.unwrap();

        let err = repo.delete("42", &current.revision).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(repo.get("42").await.unwrap(), latest);

        repo.delete("42", &latest.revision).await.unwrap();
        assert!(matches!(
            repo.delete("42", &latest.revision).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_get_missing_and_malformed() {
        let store = Arc::new(MemoryStore::new());
        store.seed("5", json!({ "id": "5", "name": 12 }));
        store.seed("6", json!({ "id": "60", "name": "Moved" }));
        let repo = CategoryRepository::new(store, fixed_clock());

        assert!(matches!(
            repo.get("4").await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            repo.get("5").await.unwrap_err(),
            AppError::DecodeFailed(_)
        ));
        assert!(matches!(
            repo.get("6").await.unwrap_err(),
            AppError::DecodeFailed(_)
        ));
    }

    #[tokio::test]
    async fn test_list_returns_store_order() {
        let store = Arc::new(MemoryStore::new());
        for id in ["10", "2", "1"] {
            store.seed(id, json!({ "id": id, "name": format!("c{}", id) }));
        }
        let repo = CategoryRepository::new(store.clone(), fixed_clock());

        let ids: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["1", "2", "10"]);

        store.set_unavailable(true);
        assert!(matches!(
            repo.list().await.unwrap_err(),
            AppError::StoreUnavailable(_)
        ));
    }
}
