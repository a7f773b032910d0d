use axum::{
    extract::{Path, Query, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{ImagePayload, SearchRecord},
    routes::AppState,
};

const DEFAULT_HISTORY_LIMIT: usize = 20;
const MAX_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ImageSearchRequest {
    pub user_id: Uuid,
    pub image_base64: String,
    /// Where the image came from, recorded with the search
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TextSearchRequest {
    pub user_id: Uuid,
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

/// Handler for image-based search
pub async fn search_by_image(
    State(state): State<AppState>,
    Json(request): Json<ImageSearchRequest>,
) -> AppResult<Json<SearchRecord>> {
    let bytes = STANDARD
        .decode(request.image_base64.trim())
        .map_err(|_| AppError::InvalidImage("Invalid base64 image data".to_string()))?;

    let payload = ImagePayload {
        bytes,
        source_url: request.image_url,
    };
    let record = state.search.perform_search(request.user_id, payload).await?;
    Ok(Json(record))
}

/// Handler for text-based search
pub async fn search_by_text(
    State(state): State<AppState>,
    Json(request): Json<TextSearchRequest>,
) -> AppResult<Json<SearchRecord>> {
    let record = state
        .search
        .perform_text_search(request.user_id, &request.query)
        .await?;
    Ok(Json(record))
}

/// Handler for a single stored search
pub async fn get_search(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SearchRecord>> {
    Ok(Json(state.search.get_search(id).await?))
}

/// Handler for a user's search history, newest first
pub async fn history(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<HistoryParams>,
) -> AppResult<Json<Vec<SearchRecord>>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);
    Ok(Json(state.search.history(user_id, limit).await?))
}
