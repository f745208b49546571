//! pgvector-backed vector index
//!
//! One table per collection:
//!
//! ```text
//! id BIGSERIAL | text TEXT | embedding vector(D) | created_at TIMESTAMPTZ | metadata JSONB
//! ```
//!
//! Search is an exact scan ordered by L2 distance, so a query returns
//! `min(k, rows)` results and ties fall back to id order. The only
//! secondary index is on `created_at`, for expiry.
//!
//! Every call checks a connection out of the pool for the duration of a
//! single statement; the connection goes back to the pool when the query
//! future completes or is dropped, so errors and timeouts cannot leak it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::types::Json;
use sqlx::FromRow;
use tracing::{debug, info};

use super::PostgresPool;
use crate::core::{Metadata, NewMemory, ScoredMemory, VectorIndex};
use crate::error::{Error, Result};
use crate::memory::validate_collection_name;

/// Vector index stored in PostgreSQL with pgvector
#[derive(Clone)]
pub struct PgVectorIndex {
    pool: PostgresPool,
}

#[derive(FromRow)]
struct ScoredRow {
    id: i64,
    text: String,
    created_at: DateTime<Utc>,
    metadata: Json<Metadata>,
    distance: f32,
}

impl From<ScoredRow> for ScoredMemory {
    fn from(row: ScoredRow) -> Self {
        ScoredMemory {
            id: row.id,
            text: row.text,
            timestamp: row.created_at,
            metadata: row.metadata.0,
            distance: row.distance,
        }
    }
}

fn create_table_sql(table: &str, dimensions: usize) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS "{table}" (
            id BIGSERIAL PRIMARY KEY,
            text TEXT NOT NULL,
            embedding vector({dimensions}) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            metadata JSONB NOT NULL DEFAULT '{{}}'::jsonb
        )"#
    )
}

fn search_sql(table: &str) -> String {
    format!(
        r#"SELECT id, text, created_at, metadata, (embedding <-> $1)::real AS distance
           FROM "{table}"
           ORDER BY embedding <-> $1, id
           LIMIT $2"#
    )
}

impl PgVectorIndex {
    /// Create an index over an initialized pool
    pub fn new(pool: PostgresPool) -> Self {
        PgVectorIndex { pool }
    }

    /// Embedding width of an existing table, if the table exists
    async fn existing_dimensions(&self, table: &str) -> Result<Option<usize>> {
        // pgvector stores the declared width as the column's type modifier.
        // to_regclass resolves through search_path, the same as unqualified DDL.
        let row: Option<(i32,)> = sqlx::query_as(
            r#"
            SELECT a.atttypmod
            FROM pg_attribute a
            WHERE a.attrelid = to_regclass($1)
              AND a.attname = 'embedding'
              AND NOT a.attisdropped
            "#,
        )
        .bind(table)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::storage("ensure_collection", e))?;

        Ok(row.map(|(typmod,)| typmod.max(0) as usize))
    }
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
    fn id(&self) -> &str {
        "pgvector"
    }

    async fn ensure_collection(&self, collection: &str, dimensions: usize) -> Result<()> {
        validate_collection_name(collection)?;

        if let Some(existing) = self.existing_dimensions(collection).await? {
            if existing != dimensions {
                return Err(Error::storage(
                    "ensure_collection",
                    format!(
                        "schema mismatch: table '{}' has {}-dim embeddings, expected {}",
                        collection, existing, dimensions
                    ),
                ));
            }
            return Ok(());
        }

        sqlx::query(&create_table_sql(collection, dimensions))
            .execute(&self.pool)
            .await
            .map_err(|e| Error::storage("ensure_collection", e))?;

        sqlx::query(&format!(
            r#"CREATE INDEX IF NOT EXISTS "idx_{collection}_created_at" ON "{collection}" (created_at)"#
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| Error::storage("ensure_collection", e))?;

        info!("Created collection {} ({} dims)", collection, dimensions);
        Ok(())
    }

    async fn insert(&self, collection: &str, memory: NewMemory) -> Result<()> {
        validate_collection_name(collection)?;

        sqlx::query(&format!(
            r#"INSERT INTO "{collection}" (text, embedding, created_at, metadata) VALUES ($1, $2, $3, $4)"#
        ))
        .bind(&memory.text)
        .bind(Vector::from(memory.embedding))
        .bind(memory.timestamp)
        .bind(Json(&memory.metadata))
        .execute(&self.pool)
        .await
        .map_err(|e| Error::storage("insert", e))?;

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredMemory>> {
        validate_collection_name(collection)?;

        let rows: Vec<ScoredRow> = sqlx::query_as(&search_sql(collection))
            .bind(Vector::from(query.to_vec()))
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::storage("search", e))?;

        debug!("pgvector search on {} returned {} rows", collection, rows.len());
        Ok(rows.into_iter().map(ScoredMemory::from).collect())
    }

    async fn delete_older_than(&self, collection: &str, cutoff: DateTime<Utc>) -> Result<u64> {
        validate_collection_name(collection)?;

        let result = sqlx::query(&format!(
            r#"DELETE FROM "{collection}" WHERE created_at < $1"#
        ))
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::storage("delete", e))?;

        Ok(result.rows_affected())
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        validate_collection_name(collection)?;

        let (count,): (i64,) = sqlx::query_as(&format!(r#"SELECT COUNT(*) FROM "{collection}""#))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::storage("count", e))?;

        Ok(count.max(0) as u64)
    }
}
