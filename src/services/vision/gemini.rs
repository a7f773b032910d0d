use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{instrument, warn};

use crate::{
    error::{AppError, AppResult},
    models::{ImagePayload, ItemDescription},
    services::vision::{parse_reply, validate_image, VisionAnalyzer},
};

const MODEL: &str = "gemini-2.0-flash";
const MAX_RETRIES: u32 = 2;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

const ANALYSIS_PROMPT: &str = "\
Analyze this fashion item and return ONLY a JSON object with these fields:
{
  \"item_type\": \"specific garment or accessory type\",
  \"brand\": \"visible brand name, or null\",
  \"style\": \"overall style, e.g. casual, formal, athletic\",
  \"detailed_description\": \"two sentences describing the item\",
  \"colors\": [\"dominant colors, most prominent first\"],
  \"material\": \"fabric or material if identifiable, or null\",
  \"key_features\": [\"distinctive details like patterns, cuts, hardware\"],
  \"estimated_brand_tier\": \"one of: luxury, premium, mid-range, fast fashion, budget\",
  \"season_occasion\": \"season or occasion the item suits\",
  \"search_terms\": [\"3-5 short shopping search phrases for this item\"],
  \"price_estimate\": \"estimated retail price range in USD, e.g. $40-80\"
}
Return the JSON object only, no commentary.";

const TEXT_PROMPT: &str = "\
A shopper describes a fashion item they want. Based on the description \
below, return ONLY a JSON object with these fields: item_type, brand, \
style, detailed_description, colors, material, key_features, \
estimated_brand_tier (one of: luxury, premium, mid-range, fast fashion, \
budget), season_occasion, search_terms (3-5 short shopping search \
phrases), price_estimate (USD range, e.g. $40-80). Infer sensible values \
where the description is silent. Shopper description: ";

/// Gemini-backed vision analyzer. Sends the image inline as base64 with
/// a fixed instruction prompt and parses the model's JSON reply.
pub struct GeminiVision {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct GenerateReply {
    #[serde(default)]
    candidates: Vec<ReplyCandidate>,
}

#[derive(Deserialize)]
struct ReplyCandidate {
    content: ReplyContent,
}

#[derive(Deserialize)]
struct ReplyContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: String,
}

impl GeminiVision {
    pub fn new(client: reqwest::Client, api_url: String, api_key: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            MODEL
        )
    }

    /// Sends one generateContent request and extracts the reply text.
    /// Timeouts, connection errors, 429 and 5xx responses surface as
    /// AnalysisUnavailable so the caller's retry loop can see them.
    async fn generate(&self, parts: serde_json::Value) -> AppResult<String> {
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "contents": [{ "parts": parts }] }))
            .send()
            .await
            .map_err(|e| AppError::AnalysisUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::AnalysisUnavailable(format!(
                "Vision provider returned {}: {}",
                status, body
            )));
        }

        let reply: GenerateReply = response
            .json()
            .await
            .map_err(|e| AppError::AnalysisUnavailable(e.to_string()))?;

        reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| {
                AppError::AnalysisUnavailable("Vision provider returned no candidates".to_string())
            })
    }

    /// Retries transient provider failures with exponential backoff.
    /// MalformedAnalysis is a contract violation, not a transient fault,
    /// so it returns immediately.
    async fn generate_with_retries(&self, parts: serde_json::Value) -> AppResult<ItemDescription> {
        let mut attempt = 0;
        loop {
            match self.generate(parts.clone()).await {
                Ok(text) => return parse_reply(&text),
                Err(e) if e.is_transient() && attempt < MAX_RETRIES => {
                    attempt += 1;
                    warn!(attempt, error = %e, "Vision request failed, retrying");
                    tokio::time::sleep(RETRY_BASE_DELAY * 2u32.pow(attempt - 1)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait::async_trait]
impl VisionAnalyzer for GeminiVision {
    #[instrument(skip_all)]
    async fn analyze(&self, image: &ImagePayload) -> AppResult<ItemDescription> {
        let mime = validate_image(&image.bytes)?;
        let parts = json!([
            { "text": ANALYSIS_PROMPT },
            { "inline_data": { "mime_type": mime, "data": STANDARD.encode(&image.bytes) } },
        ]);
        self.generate_with_retries(parts).await
    }

    #[instrument(skip_all)]
    async fn analyze_text(&self, query: &str) -> AppResult<ItemDescription> {
        let parts = json!([{ "text": format!("{}{}", TEXT_PROMPT, query) }]);
        self.generate_with_retries(parts).await
    }
}
