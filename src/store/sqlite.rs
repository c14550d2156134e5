//! SQLite-backed document store for standalone deployments.
//!
//! Revision checks are enforced with conditional statements so that a stale
//! writer never overwrites a newer revision.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use super::{
    apply_list_options, next_revision, page_ids, DocumentStore, ListOptions, StoreError,
    StoredDocument,
};

/// Document store persisted in a single SQLite table.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database file and run migrations.
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await.ok();
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let options = SqliteConnectOptions::from_str(&db_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Pick `NotFound` or `Conflict` after a conditional write touched no rows.
    async fn missed_write(&self, id: &str) -> StoreError {
        match self.exists(id).await {
            Ok(true) => StoreError::Conflict,
            Ok(false) => StoreError::NotFound,
            Err(e) => e,
        }
    }
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            rev TEXT NOT NULL,
            body TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        StoreError::Unavailable(format!("Database error: {}", err))
    }
}

fn document_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<StoredDocument, StoreError> {
    let body: String = row.get("body");
    let body = serde_json::from_str(&body)
        .map_err(|e| StoreError::Malformed(format!("stored body is not JSON: {}", e)))?;
    Ok(StoredDocument {
        id: row.get("id"),
        rev: row.get("rev"),
        body,
    })
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, id: &str) -> Result<StoredDocument, StoreError> {
        let row = sqlx::query("SELECT id, rev, body FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => document_from_row(&row),
            None => Err(StoreError::NotFound),
        }
    }

    async fn list(&self, options: ListOptions) -> Result<Vec<StoredDocument>, StoreError> {
        if options.limit.is_none() {
            let rows = sqlx::query("SELECT id, rev, body FROM documents")
                .fetch_all(&self.pool)
                .await?;

            let mut docs = rows
                .iter()
                .map(document_from_row)
                .collect::<Result<Vec<_>, _>>()?;
            apply_list_options(&mut docs, options);
            return Ok(docs);
        }

        // Paged: order the bare ids, then load only the selected bodies.
        let mut ids: Vec<String> = sqlx::query_scalar("SELECT id FROM documents")
            .fetch_all(&self.pool)
            .await?;
        page_ids(&mut ids, options);

        let mut docs = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get(&id).await {
                Ok(doc) => docs.push(doc),
                Err(StoreError::NotFound) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(docs)
    }

    async fn put(
        &self,
        id: &str,
        rev: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<String, StoreError> {
        let body = body.to_string();
        let new_rev = next_revision(rev);

        let result = match rev {
            None => {
                sqlx::query(
                    "INSERT INTO documents (id, rev, body) VALUES (?, ?, ?) ON CONFLICT(id) DO NOTHING",
                )
                .bind(id)
                .bind(&new_rev)
                .bind(&body)
                .execute(&self.pool)
                .await?
            }
            Some(expected) => {
                sqlx::query("UPDATE documents SET rev = ?, body = ? WHERE id = ? AND rev = ?")
                    .bind(&new_rev)
                    .bind(&body)
                    .bind(id)
                    .bind(expected)
                    .execute(&self.pool)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(match rev {
                None => StoreError::Conflict,
                Some(_) => self.missed_write(id).await,
            });
        }

        Ok(new_rev)
    }

    async fn delete(&self, id: &str, rev: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ? AND rev = ?")
            .bind(id)
            .bind(rev)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(self.missed_write(id).await);
        }

        Ok(())
    }
}
