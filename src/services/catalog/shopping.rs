use serde::Deserialize;
use std::time::Duration;
use tracing::{instrument, warn};

use crate::{
    cached,
    db::redis::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{ItemDescription, ProductCandidate, ShoppingItem},
    services::catalog::{build_query, CatalogSource},
};

/// Results per query requested from the API
const RESULT_COUNT: u32 = 40;
/// Cached searches live for two hours; every miss spends API quota
const CACHE_TTL_SECS: u64 = 2 * 60 * 60;
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Google Shopping catalog source. Queries are cached in Redis keyed by
/// the normalized query string; rate-limit and server errors get one
/// retry before surfacing as CatalogUnavailable.
pub struct ShoppingCatalog {
    client: reqwest::Client,
    cache: Cache,
    api_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct ShoppingReply {
    #[serde(default)]
    shopping_results: Vec<ShoppingItem>,
}

impl ShoppingCatalog {
    pub fn new(client: reqwest::Client, cache: Cache, api_url: String, api_key: String) -> Self {
        Self {
            client,
            cache,
            api_url,
            api_key,
        }
    }

    async fn fetch(&self, query: &str, category: &str) -> AppResult<Vec<ProductCandidate>> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("engine", "google_shopping"),
                ("q", query),
                ("num", &RESULT_COUNT.to_string()),
                ("api_key", &self.api_key),
            ])
            .send()
            .await
            .map_err(|e| AppError::CatalogUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CatalogUnavailable(format!(
                "Shopping API returned {}: {}",
                status, body
            )));
        }

        let reply: ShoppingReply = response
            .json()
            .await
            .map_err(|e| AppError::CatalogUnavailable(e.to_string()))?;

        Ok(reply
            .shopping_results
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| item.into_candidate(i, category))
            .collect())
    }

    /// One retry after a fixed delay covers transient rate limits; a
    /// second failure is the caller's problem.
    async fn fetch_with_retry(&self, query: &str, category: &str) -> AppResult<Vec<ProductCandidate>> {
        match self.fetch(query, category).await {
            Err(e) if e.is_transient() => {
                warn!(error = %e, query, "Shopping API request failed, retrying once");
                tokio::time::sleep(RETRY_DELAY).await;
                self.fetch(query, category).await
            }
            other => other,
        }
    }
}

#[async_trait::async_trait]
impl CatalogSource for ShoppingCatalog {
    #[instrument(skip_all, fields(item_type = %description.item_type, limit))]
    async fn find_candidates(
        &self,
        description: &ItemDescription,
        limit: usize,
    ) -> AppResult<Vec<ProductCandidate>> {
        let query = build_query(description);
        let key = CacheKey::ProductSearch(query.clone());

        // The cache holds the full fetched list; the limit is applied per
        // call so different callers can share one entry
        let result: AppResult<Vec<ProductCandidate>> =
            cached!(self.cache, key, CACHE_TTL_SECS, async {
                self.fetch_with_retry(&query, &description.item_type).await
            });

        let mut candidates = result?;
        candidates.truncate(limit);
        Ok(candidates)
    }
}
