use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::AlternatePick,
    routes::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub rec_id: String,
    /// Signed so a negative index is reported as a bad slot rather than a decode failure
    pub slot_index: i64,
}

#[derive(Debug, Serialize)]
pub struct SwapResponse {
    pub alt: AlternatePick,
}

/// Converts a client-supplied slot number
pub(crate) fn slot_from(raw: i64) -> Result<usize, AppError> {
    usize::try_from(raw)
        .map_err(|_| AppError::InvalidInput("slotIndex must not be negative".to_string()))
}

/// Handler for swapping the alternate of one slot
pub async fn swap_alternate(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<SwapRequest>,
) -> AppResult<Json<SwapResponse>> {
    if request.rec_id.trim().is_empty() {
        return Err(AppError::InvalidInput("recId is required".to_string()));
    }
    let slot_index = slot_from(request.slot_index)?;

    tracing::info!(
        request_id = %request_id,
        recommendation_id = %request.rec_id,
        slot_index,
        "Processing alternate swap"
    );

    let alt = state
        .pipeline
        .swap_alternate(&request.rec_id, slot_index)
        .await?;

    Ok(Json(SwapResponse { alt }))
}
