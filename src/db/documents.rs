use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// A stored document of some kind, with schemaless metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub kind: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Typed-collection document store
///
/// Ids are opaque strings assigned by the store. `update` merges the given top-level
/// metadata keys into the stored document; concurrent updates are last writer wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, kind: &str, metadata: Value) -> AppResult<Document>;

    async fn get(&self, kind: &str, id: &str) -> AppResult<Option<Document>>;

    async fn update(&self, id: &str, partial: Value) -> AppResult<()>;
}

/// Top-level keys of `partial` overwrite those of `target`
pub(crate) fn merge_metadata(target: &mut Value, partial: Value) -> AppResult<()> {
    let Value::Object(partial) = partial else {
        return Err(AppError::Internal(
            "document updates must be JSON objects".to_string(),
        ));
    };

    match target {
        Value::Object(existing) => existing.extend(partial),
        other => *other = Value::Object(partial),
    }
    Ok(())
}

/// Process-local store used when no database is configured, and in tests
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, kind: &str, metadata: Value) -> AppResult<Document> {
        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4().to_string(),
            kind: kind.to_string(),
            metadata,
            created_at: now,
            modified_at: now,
        };

        self.documents
            .write()
            .await
            .insert(document.id.clone(), document.clone());
        Ok(document)
    }

    async fn get(&self, kind: &str, id: &str) -> AppResult<Option<Document>> {
        Ok(self
            .documents
            .read()
            .await
            .get(id)
            .filter(|doc| doc.kind == kind)
            .cloned())
    }

    async fn update(&self, id: &str, partial: Value) -> AppResult<()> {
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;

        merge_metadata(&mut document.metadata, partial)?;
        document.modified_at = Utc::now();
        Ok(())
    }
}
