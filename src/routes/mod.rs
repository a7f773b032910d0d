use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

pub mod interactions;
pub mod recommendations;
pub mod search;
pub mod state;
pub mod users;

pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            TraceLayer::new_for_http().make_span_with(make_span_with_request_id),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Visual and text search
        .route("/search", post(search::search_by_image))
        .route("/search/text", post(search::search_by_text))
        .route("/search/history/:user_id", get(search::history))
        .route("/search/:id", get(search::get_search))
        // Interaction ledger
        .route("/interactions", post(interactions::record))
        // Recommendation feed
        .route(
            "/recommendations/:user_id",
            get(recommendations::get_feed),
        )
        .route(
            "/recommendations/:user_id/refresh",
            post(recommendations::refresh_feed),
        )
        // Account tier
        .route(
            "/users/:user_id/premium",
            post(users::set_premium).delete(users::clear_premium),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
