use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::EventKind,
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct InteractionRequest {
    pub user_id: Uuid,
    pub product_id: String,
    /// One of: view, click, favorite
    pub kind: String,
    pub category: Option<String>,
    pub price: Option<f64>,
}

/// Handler for recording a product interaction
pub async fn record(
    State(state): State<AppState>,
    Json(request): Json<InteractionRequest>,
) -> AppResult<StatusCode> {
    if request.product_id.is_empty() {
        return Err(AppError::InvalidInput("product_id is required".to_string()));
    }
    let kind = EventKind::parse(&request.kind).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "Unknown interaction kind '{}', expected view, click or favorite",
            request.kind
        ))
    })?;

    state
        .ledger
        .record(
            request.user_id,
            request.product_id,
            kind,
            request.category,
            request.price,
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}
