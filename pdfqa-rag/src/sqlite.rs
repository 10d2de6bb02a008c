//! File-backed vector store on SQLite.
//!
//! Provides [`SqliteVectorStore`], which implements [`VectorStore`] using
//! [sqlx](https://docs.rs/sqlx) with the SQLite driver. Embeddings are stored
//! as little-endian `f32` blobs and searched by brute-force cosine distance,
//! which is plenty for a single document's worth of passages.
//!
//! This module is only available when the `sqlite` feature is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use pdfqa_rag::sqlite::SqliteVectorStore;
//!
//! let store = SqliteVectorStore::open("./pdfqa.sqlite").await?;
//! store.create_collection("recipes", 384).await?;
//! store.add("recipes", &passages).await?;
//! let matches = store.search("recipes", &query_embedding, 3).await?;
//! ```

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::document::{Match, Passage, PassageMetadata};
use crate::error::{RagError, Result};
use crate::vectorstore::{VectorStore, check_dimensions, rank_by_cosine_distance};

/// A [`VectorStore`] persisted in a single SQLite database file.
///
/// Two tables back every collection: `collections` (name, dimensions) and
/// `passages` (collection, id, text, page, chunk, embedding). Passages keep
/// their insertion order through an autoincrement `seq` column.
#[derive(Debug, Clone)]
pub struct SqliteVectorStore {
    pool: SqlitePool,
}

impl SqliteVectorStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(Self::map_err)?;

        let store = Self { pool };
        store.init_schema().await?;
        debug!(path = %path.as_ref().display(), "opened sqlite vector store");
        Ok(store)
    }

    /// Wrap an existing connection pool. The schema is created if missing.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    fn map_err(e: sqlx::Error) -> RagError {
        RagError::VectorStore { backend: "sqlite".to_string(), message: e.to_string() }
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                dimensions INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(Self::map_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS passages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL REFERENCES collections(name) ON DELETE CASCADE,
                id TEXT NOT NULL,
                text TEXT NOT NULL,
                page INTEGER NOT NULL,
                chunk INTEGER NOT NULL,
                embedding BLOB NOT NULL,
                UNIQUE (collection, id)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(Self::map_err)?;

        Ok(())
    }

    async fn require_dimensions(&self, collection: &str) -> Result<usize> {
        self.dimensions(collection).await?.ok_or_else(|| RagError::VectorStore {
            backend: "sqlite".to_string(),
            message: format!("collection '{collection}' does not exist"),
        })
    }

    async fn load(&self, collection: &str, limit: Option<usize>) -> Result<Vec<Passage>> {
        // SQLite treats a negative LIMIT as "no limit".
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let rows = sqlx::query(
            "SELECT id, text, page, chunk, embedding FROM passages \
             WHERE collection = ?1 ORDER BY seq LIMIT ?2",
        )
        .bind(collection)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::map_err)?;

        rows.iter().map(passage_from_row).collect()
    }
}

fn passage_from_row(row: &SqliteRow) -> Result<Passage> {
    let id: String = row.try_get("id").map_err(SqliteVectorStore::map_err)?;
    let text: String = row.try_get("text").map_err(SqliteVectorStore::map_err)?;
    let page: i64 = row.try_get("page").map_err(SqliteVectorStore::map_err)?;
    let chunk: i64 = row.try_get("chunk").map_err(SqliteVectorStore::map_err)?;
    let blob: Vec<u8> = row.try_get("embedding").map_err(SqliteVectorStore::map_err)?;

    let metadata = PassageMetadata::new(to_u32(page)?, to_u32(chunk)?);
    Ok(Passage { id, text, embedding: decode_embedding(&blob)?, metadata })
}

fn to_u32(value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| RagError::VectorStore {
        backend: "sqlite".to_string(),
        message: format!("stored location {value} is out of range"),
    })
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(RagError::VectorStore {
            backend: "sqlite".to_string(),
            message: format!("corrupt embedding blob of {} bytes", blob.len()),
        });
    }
    Ok(blob.chunks_exact(4).map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])).collect())
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let dims = i64::try_from(dimensions)
            .map_err(|_| RagError::Config(format!("dimension {dimensions} is too large")))?;
        sqlx::query("INSERT OR IGNORE INTO collections (name, dimensions) VALUES (?1, ?2)")
            .bind(name)
            .bind(dims)
            .execute(&self.pool)
            .await
            .map_err(Self::map_err)?;

        debug!(collection = name, dimensions, "ensured sqlite collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Self::map_err)?;
        sqlx::query("DELETE FROM passages WHERE collection = ?1")
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?;
        sqlx::query("DELETE FROM collections WHERE name = ?1")
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?;
        tx.commit().await.map_err(Self::map_err)?;

        debug!(collection = name, "deleted sqlite collection");
        Ok(())
    }

    async fn add(&self, collection: &str, passages: &[Passage]) -> Result<()> {
        if passages.is_empty() {
            return Ok(());
        }

        let dimensions = self.require_dimensions(collection).await?;
        for passage in passages {
            check_dimensions(dimensions, passage.embedding.len())?;
        }

        // Dropping the transaction on error rolls it back.
        let mut tx = self.pool.begin().await.map_err(Self::map_err)?;
        for passage in passages {
            sqlx::query(
                "INSERT INTO passages (collection, id, text, page, chunk, embedding) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(collection)
            .bind(&passage.id)
            .bind(&passage.text)
            .bind(i64::from(passage.metadata.page))
            .bind(i64::from(passage.metadata.chunk))
            .bind(encode_embedding(&passage.embedding))
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?;
        }
        tx.commit().await.map_err(Self::map_err)?;

        debug!(collection, count = passages.len(), "inserted passages into sqlite");
        Ok(())
    }

    async fn get(&self, collection: &str, limit: Option<usize>) -> Result<Vec<Passage>> {
        self.load(collection, limit).await
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM passages WHERE collection = ?1")
            .bind(collection)
            .fetch_one(&self.pool)
            .await
            .map_err(Self::map_err)?;
        let n: i64 = row.try_get("n").map_err(Self::map_err)?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    async fn dimensions(&self, collection: &str) -> Result<Option<usize>> {
        let row = sqlx::query("SELECT dimensions FROM collections WHERE name = ?1")
            .bind(collection)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::map_err)?;
        match row {
            Some(row) => {
                let dims: i64 = row.try_get("dimensions").map_err(Self::map_err)?;
                Ok(Some(usize::try_from(dims).unwrap_or(0)))
            }
            None => Ok(None),
        }
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<Match>> {
        let dimensions = self.require_dimensions(collection).await?;
        check_dimensions(dimensions, embedding.len())?;

        let candidates = self.load(collection, None).await?;
        debug!(collection, candidates = candidates.len(), top_k, "scanning sqlite passages");
        Ok(rank_by_cosine_distance(candidates, embedding, top_k))
    }
}
