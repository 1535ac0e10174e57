use std::sync::Arc;

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;

use crate::{
    db::documents::{Document, DocumentStore},
    error::{AppError, AppResult},
    models::{
        kinds, BookPick, Click, ClickMetadata, OwnedBook, Record, Recommendation,
        RecommendationMetadata, RetiredAlternate, TitleCandidate, Upload, UploadMetadata,
        UploadStatus, PICK_COUNT,
    },
};

fn to_record<M: DeserializeOwned>(document: Document) -> AppResult<Record<M>> {
    let metadata = serde_json::from_value(document.metadata).map_err(|e| {
        AppError::Internal(format!(
            "stored {} {} does not decode: {}",
            document.kind, document.id, e
        ))
    })?;

    Ok(Record {
        id: document.id,
        created_at: document.created_at,
        modified_at: document.modified_at,
        metadata,
    })
}

fn to_value<M: Serialize>(metadata: &M) -> AppResult<serde_json::Value> {
    serde_json::to_value(metadata)
        .map_err(|e| AppError::Internal(format!("record does not encode: {}", e)))
}

/// Typed access to uploads, recommendations and clicks
#[derive(Clone)]
pub struct Records {
    store: Arc<dyn DocumentStore>,
}

impl Records {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn insert<M: Serialize + DeserializeOwned>(
        &self,
        kind: &str,
        metadata: &M,
    ) -> AppResult<Record<M>> {
        let document = self.store.insert(kind, to_value(metadata)?).await?;
        to_record(document)
    }

    async fn get<M: DeserializeOwned>(&self, kind: &str, id: &str) -> AppResult<Option<Record<M>>> {
        self.store
            .get(kind, id)
            .await?
            .map(to_record)
            .transpose()
    }

    pub async fn create_upload(&self, metadata: &UploadMetadata) -> AppResult<Upload> {
        self.insert(kinds::UPLOADS, metadata).await
    }

    pub async fn get_upload(&self, id: &str) -> AppResult<Option<Upload>> {
        self.get(kinds::UPLOADS, id).await
    }

    pub async fn mark_upload_analyzed(
        &self,
        id: &str,
        parsed_titles: &[TitleCandidate],
        owned_books: &[OwnedBook],
    ) -> AppResult<()> {
        self.store
            .update(
                id,
                json!({
                    "status": UploadStatus::Analyzed,
                    "parsed_titles": parsed_titles,
                    "owned_books": owned_books,
                    "notes": format!("{} books identified", owned_books.len()),
                }),
            )
            .await
    }

    /// Marks a pending upload failed; an analyzed upload keeps its status
    pub async fn mark_upload_failed(&self, id: &str, notes: &str) -> AppResult<()> {
        let current = self
            .get_upload(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Upload not found".to_string()))?;
        if current.metadata.status == UploadStatus::Analyzed {
            tracing::debug!(upload_id = %id, "Upload already analyzed, not marking failed");
            return Ok(());
        }

        self.store
            .update(
                id,
                json!({
                    "status": UploadStatus::Failed,
                    "notes": notes,
                }),
            )
            .await
    }

    pub async fn create_recommendation(
        &self,
        upload_id: &str,
        picks: [BookPick; PICK_COUNT],
    ) -> AppResult<Recommendation> {
        let metadata = RecommendationMetadata {
            upload_id: upload_id.to_string(),
            picks,
            alt_history: Vec::new(),
        };
        self.insert(kinds::RECOMMENDATIONS, &metadata).await
    }

    pub async fn get_recommendation(&self, id: &str) -> AppResult<Option<Recommendation>> {
        self.get(kinds::RECOMMENDATIONS, id).await
    }

    /// Full replace of the picks and swap history
    pub async fn update_recommendation_picks(
        &self,
        id: &str,
        picks: &[BookPick; PICK_COUNT],
        alt_history: &[RetiredAlternate],
    ) -> AppResult<()> {
        self.store
            .update(
                id,
                json!({
                    "picks": picks,
                    "alt_history": alt_history,
                }),
            )
            .await
    }

    pub async fn record_click(
        &self,
        rec_id: &str,
        slot_index: usize,
        url: &str,
        user_agent: &str,
    ) -> AppResult<Click> {
        let metadata = ClickMetadata {
            rec_id: rec_id.to_string(),
            slot_index,
            url: url.to_string(),
            user_agent: user_agent.to_string(),
            ts: Utc::now(),
        };
        self.insert(kinds::CLICKS, &metadata).await
    }
}
