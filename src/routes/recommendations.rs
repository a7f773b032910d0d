use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{error::AppResult, models::RecommendationSet, routes::AppState};

/// Handler for the personalized feed. First access for a user generates
/// the feed on the spot; afterwards the stored set is served.
pub async fn get_feed(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<RecommendationSet>> {
    Ok(Json(state.recommendations.get_or_generate(user_id).await?))
}

/// Handler for an explicit feed rebuild
pub async fn refresh_feed(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<RecommendationSet>> {
    Ok(Json(state.recommendations.generate(user_id).await?))
}
