use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::Redirect,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::PICK_COUNT,
    routes::{alternates::slot_from, AppState},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickRequest {
    #[serde(default)]
    pub rec_id: String,
    pub slot_index: Option<i64>,
    #[serde(default)]
    pub url: String,
    pub user_agent: Option<String>,
}

fn header_user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Handler for click tracking; the write happens in the background
pub async fn record_click(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Json(request): Json<ClickRequest>,
) -> AppResult<Json<Value>> {
    let raw_slot = match request.slot_index {
        Some(slot) if !request.rec_id.trim().is_empty() && !request.url.trim().is_empty() => slot,
        _ => {
            return Err(AppError::InvalidInput(
                "recId, slotIndex and url are required".to_string(),
            ))
        }
    };
    let slot_index = slot_from(raw_slot)?;
    if slot_index >= PICK_COUNT {
        return Err(AppError::InvalidInput(format!(
            "slotIndex must be between 0 and {}",
            PICK_COUNT - 1
        )));
    }

    tracing::debug!(
        request_id = %request_id,
        recommendation_id = %request.rec_id,
        slot_index,
        "Recording click"
    );

    let user_agent = request
        .user_agent
        .unwrap_or_else(|| header_user_agent(&headers));
    state
        .pipeline
        .record_click(request.rec_id, slot_index, request.url, user_agent);

    Ok(Json(json!({ "ok": true })))
}

/// Redirects to the purchase link of a slot and records the click
pub async fn redirect(
    State(state): State<Arc<AppState>>,
    Path((rec_id, slot_index)): Path<(String, usize)>,
    headers: HeaderMap,
) -> AppResult<Redirect> {
    let url = state.pipeline.click_target(&rec_id, slot_index).await?;
    state
        .pipeline
        .record_click(rec_id, slot_index, url.clone(), header_user_agent(&headers));
    Ok(Redirect::temporary(&url))
}
