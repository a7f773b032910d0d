use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Vision analysis unavailable: {0}")]
    AnalysisUnavailable(String),

    /// The vision provider replied, but the reply does not fit the
    /// ItemDescription contract. Never retried; the raw reply is kept
    /// for diagnostics.
    #[error("Malformed analysis reply: {detail}")]
    MalformedAnalysis { detail: String, raw: String },

    #[error("Daily search limit reached, resets in {reset_in_secs}s")]
    QuotaExceeded { reset_in_secs: i64 },

    #[error("Product catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::InvalidImage(msg) | AppError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::QuotaExceeded { reset_in_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({
                    "error": "Daily search limit reached",
                    "reset_in_secs": reset_in_secs,
                }),
            ),
            AppError::AnalysisUnavailable(_)
            | AppError::MalformedAnalysis { .. }
            | AppError::CatalogUnavailable(_) => {
                (StatusCode::BAD_GATEWAY, json!({ "error": self.to_string() }))
            }
            AppError::Database(_) | AppError::Cache(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": self.to_string() }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl AppError {
    /// True for failures worth retrying inside an adapter (provider
    /// timeouts, quota and 5xx replies). Contract violations and
    /// business-rule failures are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::AnalysisUnavailable(_) | AppError::CatalogUnavailable(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
