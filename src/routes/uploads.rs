use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Extension, Json,
};
use serde::Serialize;

use crate::{
    error::AppResult,
    middleware::RequestId,
    routes::AppState,
    services::identity::{client_ip, hash_ip},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub upload_id: String,
    pub image_url: String,
}

/// Handler for shelf photo uploads; the body is the raw image
pub async fn create_upload(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<(StatusCode, Json<UploadResponse>)> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    tracing::info!(
        request_id = %request_id,
        content_type = %content_type,
        size = body.len(),
        "Processing upload"
    );

    let ip_hash = hash_ip(&client_ip(&headers), &state.config.salt_secret);
    let upload = state
        .pipeline
        .submit_upload(&body, content_type, ip_hash)
        .await?;

    let image_url = upload
        .metadata
        .source_image
        .map(|media| media.url)
        .unwrap_or_default();

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            upload_id: upload.id,
            image_url,
        }),
    ))
}
