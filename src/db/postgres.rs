use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use uuid::Uuid;

use crate::{
    db::documents::{Document, DocumentStore},
    error::{AppError, AppResult},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    kind: String,
    metadata: Json<Value>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
            metadata: row.metadata.0,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

/// Document store backed by a single `documents` table with `jsonb` metadata
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the documents table if it does not exist yet
    pub async fn ensure_schema(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                modified_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS documents_kind_idx ON documents (kind)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, kind: &str, metadata: Value) -> AppResult<Document> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            INSERT INTO documents (id, kind, metadata)
            VALUES ($1, $2, $3)
            RETURNING id, kind, metadata, created_at, modified_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(kind)
        .bind(Json(metadata))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get(&self, kind: &str, id: &str) -> AppResult<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, kind, metadata, created_at, modified_at
            FROM documents
            WHERE id = $1 AND kind = $2
            "#,
        )
        .bind(id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Document::from))
    }

    async fn update(&self, id: &str, partial: Value) -> AppResult<()> {
        if !partial.is_object() {
            return Err(AppError::Internal(
                "document updates must be JSON objects".to_string(),
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE documents
            SET metadata = metadata || $2, modified_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Json(partial))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Document {} not found", id)));
        }
        Ok(())
    }
}
