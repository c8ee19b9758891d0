//! Postgres-backed document store.
//!
//! Documents live in a single `documents` table as JSONB, keyed by
//! `(collection, id)`. Filters are evaluated with JSONB containment
//! (`body @> filter`), so a filter only matches top-level field equality.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database (any code) | `Backend` |
//! | PoolClosed / PoolTimedOut / Io / Tls | `Unavailable` |
//! | Decode / ColumnDecode | `Codec` |
//! | Other | `Backend` |

use serde_json::Value as JsonValue;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use super::r#trait::{Collection, DocumentStore, Filter, StoreError};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id UUID NOT NULL,
    body JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (collection, id)
)
"#;

const CREATE_NAME_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_documents_name
    ON documents (collection, (body->>'name'))
"#;

/// Postgres-backed document store.
///
/// Uses an SQLx connection pool, so it is `Send + Sync` and cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the documents table and name index if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in [CREATE_TABLE, CREATE_NAME_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    /// Close the pool; further calls fail with `StoreError::Unavailable`.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait::async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[instrument(skip(self), fields(collection = %collection), err)]
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<JsonValue>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT body
            FROM documents
            WHERE collection = $1 AND body @> $2
            ORDER BY created_at, id
            LIMIT 1
            "#,
        )
        .bind(collection.as_str())
        .bind(filter.to_json())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_one", e))?;

        row.map(|row| {
            row.try_get::<JsonValue, _>("body")
                .map_err(|e| map_sqlx_error("find_one", e))
        })
        .transpose()
    }

    #[instrument(skip(self), fields(collection = %collection), err)]
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<JsonValue>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT body
            FROM documents
            WHERE collection = $1 AND body @> $2
            ORDER BY created_at, id
            "#,
        )
        .bind(collection.as_str())
        .bind(filter.to_json())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find", e))?;

        rows.iter()
            .map(|row| {
                row.try_get::<JsonValue, _>("body")
                    .map_err(|e| map_sqlx_error("find", e))
            })
            .collect()
    }

    #[instrument(skip(self, document), fields(collection = %collection, id = %id), err)]
    async fn save(
        &self,
        collection: Collection,
        id: Uuid,
        document: JsonValue,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET
                body = EXCLUDED.body,
                updated_at = NOW()
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("save", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(collection = %collection), err)]
    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM documents
            WHERE (collection, id) IN (
                SELECT collection, id
                FROM documents
                WHERE collection = $1 AND body @> $2
                ORDER BY created_at, id
                LIMIT 1
            )
            "#,
        )
        .bind(collection.as_str())
        .bind(filter.to_json())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_one", e))?;

        Ok(result.rows_affected())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Backend(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {}", operation))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {}: {}", operation, e)),
        sqlx::Error::Tls(e) => StoreError::Unavailable(format!("tls error in {}: {}", operation, e)),
        e @ (sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. }) => {
            StoreError::Codec(format!("failed to decode row in {}: {}", operation, e))
        }
        other => StoreError::Backend(format!("error in {}: {}", operation, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_map_to_unavailable() {
        assert!(matches!(
            map_sqlx_error("find", sqlx::Error::PoolClosed),
            StoreError::Unavailable(msg) if msg.contains("find")
        ));
        assert!(matches!(
            map_sqlx_error("save", sqlx::Error::RowNotFound),
            StoreError::Backend(_)
        ));
    }
}
