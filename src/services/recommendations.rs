use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{BrandTier, EventKind, ItemDescription, PriceRange, RecommendationSet},
    services::{catalog::CatalogSource, similarity},
    store::Store,
};

// Preference signal weights
const WEIGHT_SEARCH: f64 = 2.0;
const WEIGHT_FAVORITE: f64 = 3.0;
const WEIGHT_OTHER: f64 = 1.0;

/// How far back interaction history counts
const HISTORY_WINDOW_DAYS: i64 = 90;
const MAX_HISTORY_EVENTS: usize = 500;
const MAX_RECENT_SEARCHES: usize = 20;

/// Candidate pool requested per feed, before ranking trims it
const POOL_FACTOR: usize = 3;

/// Personalized product feed built from a user's search and interaction
/// history. Preferences are aggregated into a synthetic item description
/// which reuses the same catalog and scoring path as a search, so the
/// feed and search results stay mutually consistent.
pub struct RecommendationEngine {
    store: Arc<dyn Store>,
    catalog: Arc<dyn CatalogSource>,
    feed_size: usize,
}

#[derive(Default)]
struct Preferences {
    categories: HashMap<String, f64>,
    colors: HashMap<String, f64>,
    styles: HashMap<String, f64>,
    weighted_prices: Vec<(f64, f64)>,
}

impl Preferences {
    fn bump(map: &mut HashMap<String, f64>, key: &str, weight: f64) {
        if key.is_empty() {
            return;
        }
        *map.entry(key.to_lowercase()).or_insert(0.0) += weight;
    }

    fn price(&mut self, price: f64, weight: f64) {
        if price > 0.0 {
            self.weighted_prices.push((price, weight));
        }
    }

    fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.colors.is_empty() && self.styles.is_empty()
    }

    /// Keys ordered by weight descending; ties broken alphabetically so
    /// the profile is deterministic for a given history.
    fn top(map: &HashMap<String, f64>, n: usize) -> Vec<String> {
        let mut entries: Vec<(&String, &f64)> = map.iter().collect();
        entries.sort_by(|a, b| {
            b.1.partial_cmp(a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(b.0))
        });
        entries.into_iter().take(n).map(|(k, _)| k.clone()).collect()
    }

    fn price_band(&self) -> Option<PriceRange> {
        let total_weight: f64 = self.weighted_prices.iter().map(|(_, w)| w).sum();
        if total_weight == 0.0 {
            return None;
        }
        let mean = self
            .weighted_prices
            .iter()
            .map(|(p, w)| p * w)
            .sum::<f64>()
            / total_weight;
        Some(PriceRange {
            low: mean * 0.7,
            high: mean * 1.3,
        })
    }

    /// Collapses the aggregated preferences into one item description
    /// the catalog and scorer can consume directly.
    fn into_description(self) -> ItemDescription {
        let categories = Self::top(&self.categories, 3);
        let colors = Self::top(&self.colors, 3);
        let styles = Self::top(&self.styles, 2);
        let price_estimate = self.price_band();

        let item_type = categories
            .first()
            .cloned()
            .unwrap_or_else(|| "clothing".to_string());
        let style = styles.first().cloned().unwrap_or_else(|| "casual".to_string());

        let mut search_terms: Vec<String> = Vec::new();
        for category in &categories {
            match colors.first() {
                Some(color) => search_terms.push(format!("{} {}", color, category)),
                None => search_terms.push(category.clone()),
            }
        }

        ItemDescription {
            detailed_description: format!("{} {} the shopper gravitates toward", style, item_type),
            item_type,
            brand: None,
            style,
            colors,
            material: None,
            key_features: vec![],
            brand_tier: BrandTier::MidRange,
            season_occasion: "everyday".to_string(),
            search_terms,
            price_estimate,
        }
    }
}

/// Profile used for brand-new users with no history at all
fn trending_description() -> ItemDescription {
    ItemDescription {
        item_type: "clothing".to_string(),
        brand: None,
        style: "casual".to_string(),
        detailed_description: "Popular everyday fashion picks".to_string(),
        colors: vec!["black".to_string(), "white".to_string()],
        material: None,
        key_features: vec![],
        brand_tier: BrandTier::MidRange,
        season_occasion: "everyday".to_string(),
        search_terms: vec![
            "trending clothing".to_string(),
            "wardrobe essentials".to_string(),
        ],
        price_estimate: Some(PriceRange {
            low: 20.0,
            high: 80.0,
        }),
    }
}

impl RecommendationEngine {
    pub fn new(store: Arc<dyn Store>, catalog: Arc<dyn CatalogSource>, feed_size: usize) -> Self {
        Self {
            store,
            catalog,
            feed_size,
        }
    }

    async fn build_profile(&self, user_id: Uuid) -> AppResult<ItemDescription> {
        let mut prefs = Preferences::default();

        let searches = self
            .store
            .recent_searches(user_id, MAX_RECENT_SEARCHES)
            .await?;
        for search in &searches {
            let d = &search.description;
            Preferences::bump(&mut prefs.categories, &d.item_type, WEIGHT_SEARCH);
            Preferences::bump(&mut prefs.styles, &d.style, WEIGHT_SEARCH);
            for color in &d.colors {
                Preferences::bump(&mut prefs.colors, color, WEIGHT_SEARCH);
            }
            if let Some(band) = &d.price_estimate {
                prefs.price(band.midpoint(), WEIGHT_SEARCH);
            }
        }

        let since = Utc::now() - Duration::days(HISTORY_WINDOW_DAYS);
        let events = self
            .store
            .recent_interactions(user_id, since, MAX_HISTORY_EVENTS)
            .await?;
        for event in &events {
            let weight = match event.kind {
                EventKind::Favorite => WEIGHT_FAVORITE,
                _ => WEIGHT_OTHER,
            };
            if let Some(category) = &event.category {
                Preferences::bump(&mut prefs.categories, category, weight);
            }
            if let Some(price) = event.price {
                prefs.price(price, weight);
            }
        }

        if prefs.is_empty() {
            return Ok(trending_description());
        }
        Ok(prefs.into_description())
    }

    /// Builds a fresh feed for the user and persists it, replacing any
    /// previous set. Products the user already favorited are excluded.
    /// A catalog outage is never surfaced: the previous feed (or an
    /// empty one) is served instead.
    #[instrument(skip(self))]
    pub async fn generate(&self, user_id: Uuid) -> AppResult<RecommendationSet> {
        let profile = self.build_profile(user_id).await?;
        let favorited = self.store.favorited_product_ids(user_id).await?;

        let mut candidates = match self
            .catalog
            .find_candidates(&profile, self.feed_size * POOL_FACTOR)
            .await
        {
            Ok(candidates) => candidates,
            Err(e @ AppError::CatalogUnavailable(_)) => {
                warn!(error = %e, "Catalog unavailable, keeping the previous feed");
                return Ok(self
                    .store
                    .get_recommendations(user_id)
                    .await?
                    .unwrap_or(RecommendationSet {
                        user_id,
                        products: Vec::new(),
                        generated_at: Utc::now(),
                    }));
            }
            Err(e) => return Err(e),
        };
        candidates.retain(|c| !favorited.contains(&c.id));

        let products = similarity::rank(&profile, candidates, self.feed_size);

        let set = RecommendationSet {
            user_id,
            products,
            generated_at: Utc::now(),
        };
        self.store.replace_recommendations(&set).await?;
        Ok(set)
    }

    /// Returns the stored feed, generating one on first access
    pub async fn get_or_generate(&self, user_id: Uuid) -> AppResult<RecommendationSet> {
        match self.store.get_recommendations(user_id).await? {
            Some(set) => Ok(set),
            None => self.generate(user_id).await,
        }
    }

    /// Refreshes the feed off the request path. Failures only delay the
    /// next refresh, so they are logged and dropped.
    pub fn refresh_in_background(self: &Arc<Self>, user_id: Uuid) {
        let engine = self.clone();
        tokio::spawn(async move {
            if let Err(e) = engine.generate(user_id).await {
                error!(error = %e, user_id = %user_id, "Background recommendation refresh failed");
            }
        });
    }
}
