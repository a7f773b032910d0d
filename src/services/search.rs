use std::sync::Arc;

use chrono::Utc;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{ImagePayload, ItemDescription, SearchRecord},
    services::{
        catalog::CatalogSource,
        quota::QuotaGate,
        recommendations::RecommendationEngine,
        similarity,
        vision::{validate_query, VisionAnalyzer},
    },
    store::Store,
};

/// Candidates fetched per search, before ranking trims to the top-N
const CANDIDATE_POOL: usize = 40;

/// Runs the full search pipeline: quota gate, vision analysis, catalog
/// lookup, scoring, and persistence.
///
/// Quota is charged only for searches that reach the result stage: any
/// failure after acquiring the slot releases it, so a provider outage
/// never eats a user's daily allowance. A catalog outage that survives
/// the adapter's retry degrades to a result with no products instead of
/// failing the search outright.
pub struct SearchOrchestrator {
    vision: Arc<dyn VisionAnalyzer>,
    catalog: Arc<dyn CatalogSource>,
    store: Arc<dyn Store>,
    quota: Arc<QuotaGate>,
    recommendations: Arc<RecommendationEngine>,
}

impl SearchOrchestrator {
    pub fn new(
        vision: Arc<dyn VisionAnalyzer>,
        catalog: Arc<dyn CatalogSource>,
        store: Arc<dyn Store>,
        quota: Arc<QuotaGate>,
        recommendations: Arc<RecommendationEngine>,
    ) -> Self {
        Self {
            vision,
            catalog,
            store,
            quota,
            recommendations,
        }
    }

    #[instrument(skip(self, image), fields(user_id = %user_id))]
    pub async fn perform_search(
        &self,
        user_id: Uuid,
        image: ImagePayload,
    ) -> AppResult<SearchRecord> {
        let lease = self.quota.acquire(user_id).await?;

        let result = async {
            let description = self.vision.analyze(&image).await?;
            self.complete_search(user_id, image.source_url.clone(), description)
                .await
        }
        .await;

        match result {
            Ok(record) => Ok(record),
            Err(e) => {
                self.quota.release(lease).await;
                Err(e)
            }
        }
    }

    /// Text searches run the same pipeline with the analyzer's text path
    /// standing in for image analysis.
    #[instrument(skip(self, query), fields(user_id = %user_id))]
    pub async fn perform_text_search(
        &self,
        user_id: Uuid,
        query: &str,
    ) -> AppResult<SearchRecord> {
        // Reject bad queries before spending a quota slot
        let query = validate_query(query)?;
        let lease = self.quota.acquire(user_id).await?;

        let result = async {
            let description = self.vision.analyze_text(query).await?;
            self.complete_search(user_id, None, description).await
        }
        .await;

        match result {
            Ok(record) => Ok(record),
            Err(e) => {
                self.quota.release(lease).await;
                Err(e)
            }
        }
    }

    async fn complete_search(
        &self,
        user_id: Uuid,
        image_url: Option<String>,
        description: ItemDescription,
    ) -> AppResult<SearchRecord> {
        let candidates = match self
            .catalog
            .find_candidates(&description, CANDIDATE_POOL)
            .await
        {
            Ok(candidates) => candidates,
            Err(e @ AppError::CatalogUnavailable(_)) => {
                warn!(error = %e, "Catalog unavailable, returning search without products");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let products = similarity::rank(&description, candidates, similarity::MAX_RESULTS);

        let record = SearchRecord {
            id: Uuid::new_v4(),
            user_id,
            image_url,
            description,
            products,
            created_at: Utc::now(),
        };
        self.store.insert_search(&record).await?;

        // The new search changes the preference profile; refresh off-path
        self.recommendations.refresh_in_background(user_id);

        Ok(record)
    }

    pub async fn get_search(&self, id: Uuid) -> AppResult<SearchRecord> {
        self.store
            .get_search(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Search {} not found", id)))
    }

    pub async fn history(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<SearchRecord>> {
        self.store.recent_searches(user_id, limit).await
    }
}
