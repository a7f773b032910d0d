use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::AppResult, routes::AppState};

#[derive(Debug, Deserialize)]
pub struct PremiumRequest {
    /// Omitted or null means the premium tier does not expire
    pub expires_at: Option<DateTime<Utc>>,
}

/// Handler for marking a user premium. Billing happens elsewhere; this
/// endpoint only records the entitlement the quota gate consults.
pub async fn set_premium(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<PremiumRequest>,
) -> AppResult<StatusCode> {
    state.quota.set_premium(user_id, request.expires_at).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for revoking premium; the user drops back to the free tier
pub async fn clear_premium(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.quota.clear_premium(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
