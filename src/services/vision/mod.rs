//! Vision analysis abstraction.
//!
//! Providers translate raw image bytes (or a text description) into a
//! structured ItemDescription. Transient provider failures are retried
//! inside the provider; a reply that cannot be parsed into the schema is
//! a contract violation and is never retried.

use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::{ImagePayload, ItemDescription, VisionReply},
};

pub mod fixture;
pub mod gemini;

pub use fixture::FixtureVision;
pub use gemini::GeminiVision;

/// Largest accepted upload, 10 MiB
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const SUPPORTED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Trait for vision analysis providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Analyze an image and describe the item it shows
    async fn analyze(&self, image: &ImagePayload) -> AppResult<ItemDescription>;

    /// Analyze a free-text description of an item, producing the same
    /// schema as image analysis
    async fn analyze_text(&self, query: &str) -> AppResult<ItemDescription>;
}

/// Rejects payloads the providers should never be called with: empty
/// bodies, oversized uploads, and bytes that do not sniff as a supported
/// image format.
#[instrument(skip_all, fields(size = bytes.len()))]
pub fn validate_image(bytes: &[u8]) -> AppResult<&'static str> {
    if bytes.is_empty() {
        return Err(AppError::InvalidImage("Image is empty".to_string()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AppError::InvalidImage(
            "Image too large, maximum size is 10MB".to_string(),
        ));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| AppError::InvalidImage("Unrecognized image format".to_string()))?;

    let mime = kind.mime_type();
    if !SUPPORTED_MIME_TYPES.contains(&mime) {
        return Err(AppError::InvalidImage(format!(
            "Unsupported image type {}, supported: JPEG, PNG, GIF, WebP",
            mime
        )));
    }

    Ok(mime)
}

/// Text queries must carry enough signal and fit the provider's input
pub fn validate_query(query: &str) -> AppResult<&str> {
    let trimmed = query.trim();
    if trimmed.len() < 3 {
        return Err(AppError::InvalidInput(
            "Search query must be at least 3 characters".to_string(),
        ));
    }
    if trimmed.len() > 500 {
        return Err(AppError::InvalidInput(
            "Search query is too long (max 500 characters)".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Parses a provider reply into an ItemDescription. Providers wrap JSON
/// in markdown code fences; those are stripped before parsing. Anything
/// that still fails to parse is a MalformedAnalysis carrying the raw
/// reply for diagnostics.
pub fn parse_reply(text: &str) -> AppResult<ItemDescription> {
    let cleaned = strip_code_fences(text);

    let reply: VisionReply =
        serde_json::from_str(cleaned).map_err(|e| AppError::MalformedAnalysis {
            detail: e.to_string(),
            raw: text.to_string(),
        })?;

    Ok(reply.into())
}

fn strip_code_fences(text: &str) -> &str {
    let mut cleaned = text.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    cleaned.trim()
}
