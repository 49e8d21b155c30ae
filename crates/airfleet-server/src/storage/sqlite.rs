//! SQLite document store (embedded, no external dependencies)
//!
//! Every collection shares one table of JSON bodies keyed by
//! `(collection, id)`. Filters other than by-id are evaluated in process after
//! loading the collection; updates read, modify and write each matched body
//! inside one `BEGIN IMMEDIATE` transaction, so writers queue on the busy
//! timeout instead of failing a deferred lock upgrade.

use airfleet_core::document::{document_id, id_value, set_path, ID_FIELD};
use airfleet_core::{Document, DocumentStore, Filter, FleetError, RecordId, Result, Update};
use anyhow::Context;
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use std::sync::Arc;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteStore {
    pool: Arc<SqlitePool>,
}

fn store_err(e: sqlx::Error) -> FleetError {
    FleetError::Store(e.to_string())
}

fn decode_body(body: &str) -> Result<Document> {
    Ok(serde_json::from_str(body)?)
}

/// A pooled connection holding the database write lock
///
/// Dropped before `commit`, the connection is detached from the pool and
/// closed, which rolls the transaction back.
struct WriteTx {
    conn: Option<PoolConnection<Sqlite>>,
}

impl WriteTx {
    async fn begin(pool: &SqlitePool) -> Result<Self> {
        let conn = pool.acquire().await.map_err(store_err)?;
        let mut tx = Self { conn: Some(conn) };
        sqlx::query("BEGIN IMMEDIATE")
            .execute(tx.conn()?)
            .await
            .map_err(store_err)?;
        Ok(tx)
    }

    fn conn(&mut self) -> Result<&mut SqliteConnection> {
        self.conn
            .as_deref_mut()
            .ok_or_else(|| FleetError::Store("transaction already finished".to_string()))
    }

    async fn commit(mut self) -> Result<()> {
        sqlx::query("COMMIT")
            .execute(self.conn()?)
            .await
            .map_err(store_err)?;
        // Back to the pool with no transaction open
        self.conn = None;
        Ok(())
    }
}

impl Drop for WriteTx {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::warn!("Closing SQLite connection with an unfinished write");
            drop(conn.detach());
        }
    }
}

impl SqliteStore {
    pub async fn new(database_path: &str) -> anyhow::Result<Self> {
        tracing::info!("Opening SQLite database at: {}", database_path);

        if let Some(parent) = std::path::Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| {
                format!("Failed to connect to SQLite database at: {}", database_path)
            })?;

        Self::from_pool(pool).await
    }

    /// Private in-memory database; one connection so every query sees it
    pub async fn in_memory() -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory SQLite database")?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> anyhow::Result<Self> {
        Self::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::info!("Database initialization complete");
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// `(id, body)` rows of `collection` matching `filter`
    async fn matching(
        conn: &mut SqliteConnection,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<(String, Document)>> {
        let rows: Vec<(String, String)> = match filter {
            Filter::Id(id) => {
                sqlx::query_as("SELECT id, body FROM documents WHERE collection = ? AND id = ?")
                    .bind(collection)
                    .bind(id.to_string())
                    .fetch_all(&mut *conn)
                    .await
                    .map_err(store_err)?
            }
            _ => sqlx::query_as("SELECT id, body FROM documents WHERE collection = ? ORDER BY id")
                .bind(collection)
                .fetch_all(&mut *conn)
                .await
                .map_err(store_err)?,
        };

        let mut matched = Vec::with_capacity(rows.len());
        for (id, body) in rows {
            let doc = decode_body(&body)?;
            if filter.matches(&doc) {
                matched.push((id, doc));
            }
        }
        Ok(matched)
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        let mut conn = self.pool.acquire().await.map_err(store_err)?;
        let matched = Self::matching(&mut conn, collection, filter).await?;
        Ok(matched.into_iter().map(|(_, doc)| doc).collect())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        Ok(self.find(collection, filter).await?.into_iter().next())
    }

    async fn insert(&self, collection: &str, mut document: Document) -> Result<RecordId> {
        let id = match document_id(&document) {
            Some(id) => id,
            None => {
                let id = RecordId::generate();
                set_path(&mut document, ID_FIELD, id_value(id));
                id
            }
        };
        let body = serde_json::to_string(&document)?;

        sqlx::query("INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)")
            .bind(collection)
            .bind(id.to_string())
            .bind(body)
            .execute(self.pool.as_ref())
            .await
            .map_err(store_err)?;

        tracing::debug!("Inserted {} into {}", id, collection);
        Ok(id)
    }

    async fn update(&self, collection: &str, filter: &Filter, update: &Update) -> Result<u64> {
        let mut tx = WriteTx::begin(&self.pool).await?;
        let matched = Self::matching(tx.conn()?, collection, filter).await?;

        for (id, mut doc) in matched.iter().cloned() {
            update.apply(&mut doc);
            let body = serde_json::to_string(&doc)?;
            sqlx::query("UPDATE documents SET body = ? WHERE collection = ? AND id = ?")
                .bind(body)
                .bind(collection)
                .bind(id)
                .execute(tx.conn()?)
                .await
                .map_err(store_err)?;
        }

        tx.commit().await?;
        Ok(matched.len() as u64)
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let mut tx = WriteTx::begin(&self.pool).await?;
        let matched = Self::matching(tx.conn()?, collection, filter).await?;

        for (id, _) in &matched {
            sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id)
                .execute(tx.conn()?)
                .await
                .map_err(store_err)?;
        }

        tx.commit().await?;
        Ok(matched.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_document_round_trip() {
        let store = SqliteStore::in_memory().await.unwrap();
        let id = store
            .insert("aircraft", json!({"general": {"name": "Beaver"}, "engines": []}))
            .await
            .unwrap();

        let doc = store
            .find_one("aircraft", &Filter::by_id(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["general"]["name"], "Beaver");
        assert_eq!(document_id(&doc), Some(id));
        assert!(store.find("engines", &Filter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_applies_field_ops() {
        let store = SqliteStore::in_memory().await.unwrap();
        let id = store.insert("users", json!({"airlines": []})).await.unwrap();
        let airline = RecordId::generate();

        let toggle = Update::new().toggle_ids("airlines", &[airline]);
        assert_eq!(store.update("users", &Filter::by_id(id), &toggle).await.unwrap(), 1);

        let owners = store
            .find("users", &Filter::eq("airlines", id_value(airline)))
            .await
            .unwrap();
        assert_eq!(owners.len(), 1);

        assert_eq!(store.update("users", &Filter::by_id(id), &toggle).await.unwrap(), 1);
        let doc = store.find_one("users", &Filter::by_id(id)).await.unwrap().unwrap();
        assert_eq!(doc["airlines"], json!([]));
    }

    #[tokio::test]
    async fn test_missing_documents_match_nothing() {
        let store = SqliteStore::in_memory().await.unwrap();
        let missing = Filter::by_id(RecordId::generate());
        let update = Update::new().set("model", "PT6A");
        assert_eq!(store.update("engines", &missing, &update).await.unwrap(), 0);
        assert_eq!(store.delete("engines", &missing).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("airfleet.db");
        let store = Arc::new(SqliteStore::new(&path.to_string_lossy()).await.unwrap());

        let mut ids = Vec::new();
        for _ in 0..16 {
            ids.push(store.insert("aircraft", json!({"tags": []})).await.unwrap());
        }

        let mut handles = Vec::new();
        for n in 0..80 {
            let store = store.clone();
            let id = ids[n % ids.len()];
            handles.push(tokio::spawn(async move {
                let update = Update::new().add_ids("tags", &[RecordId::generate()]);
                store.update("aircraft", &Filter::by_id(id), &update).await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 1);
        }

        for id in ids {
            let doc = store.find_one("aircraft", &Filter::by_id(id)).await.unwrap().unwrap();
            assert_eq!(doc["tags"].as_array().unwrap().len(), 5);
        }
    }

    #[tokio::test]
    async fn test_duplicate_id_is_a_store_error() {
        let store = SqliteStore::in_memory().await.unwrap();
        let id = RecordId::generate();
        let doc = json!({"id": id.to_string()});
        store.insert("flights", doc.clone()).await.unwrap();
        let err = store.insert("flights", doc).await.unwrap_err();
        assert!(matches!(err, FleetError::Store(_)));
    }
}
