use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    middleware::RequestId,
    routes::AppState,
    services::{
        identity::{client_ip, hash_ip},
        AnalyzeInput,
    },
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub upload_id: Option<String>,
    pub manual_titles: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub recommendation_id: String,
}

/// Handler for the analyze endpoint
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Json(request): Json<AnalyzeRequest>,
) -> AppResult<Json<AnalyzeResponse>> {
    let input = AnalyzeInput::from_parts(
        request.upload_id.as_deref(),
        request.manual_titles.as_deref(),
    )?;

    let mode = match input {
        AnalyzeInput::Upload(_) => "upload",
        AnalyzeInput::Manual(_) => "manual",
    };
    tracing::info!(request_id = %request_id, mode, "Processing analyze request");

    let ip_hash = hash_ip(&client_ip(&headers), &state.config.salt_secret);
    let recommendation_id = state.pipeline.analyze(input, ip_hash).await?;

    tracing::info!(
        request_id = %request_id,
        recommendation_id = %recommendation_id,
        "Analysis completed"
    );

    Ok(Json(AnalyzeResponse { recommendation_id }))
}
