use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{error::AppResult, models::Recommendation, routes::AppState};

/// Handler for fetching a stored recommendation
pub async fn get_recommendation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Recommendation>> {
    let recommendation = state.pipeline.get_recommendation(&id).await?;
    Ok(Json(recommendation))
}
