use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{EventKind, InteractionEvent, RecommendationSet, SearchRecord, UserQuota},
    store::Store,
};

/// In-memory store used by tests and keyless development runs. Not
/// durable; everything lives behind one RwLock.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    searches: Vec<SearchRecord>,
    interactions: Vec<InteractionEvent>,
    quotas: HashMap<Uuid, UserQuota>,
    recommendations: HashMap<Uuid, RecommendationSet>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn insert_search(&self, record: &SearchRecord) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.searches.push(record.clone());
        Ok(())
    }

    async fn get_search(&self, id: Uuid) -> AppResult<Option<SearchRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.searches.iter().find(|r| r.id == id).cloned())
    }

    async fn recent_searches(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<SearchRecord>> {
        let inner = self.inner.read().await;
        let mut records: Vec<SearchRecord> = inner
            .searches
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit);
        Ok(records)
    }

    async fn append_interaction(&self, event: &InteractionEvent) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.interactions.push(event.clone());
        Ok(())
    }

    async fn recent_interactions(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        max: usize,
    ) -> AppResult<Vec<InteractionEvent>> {
        let inner = self.inner.read().await;
        let mut events: Vec<InteractionEvent> = inner
            .interactions
            .iter()
            .filter(|e| e.user_id == user_id && e.created_at >= since)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        events.truncate(max);
        Ok(events)
    }

    async fn favorited_product_ids(&self, user_id: Uuid) -> AppResult<HashSet<String>> {
        let inner = self.inner.read().await;
        Ok(inner
            .interactions
            .iter()
            .filter(|e| e.user_id == user_id && e.kind == EventKind::Favorite)
            .map(|e| e.product_id.clone())
            .collect())
    }

    async fn get_quota(&self, user_id: Uuid) -> AppResult<Option<UserQuota>> {
        let inner = self.inner.read().await;
        Ok(inner.quotas.get(&user_id).cloned())
    }

    async fn put_quota(&self, quota: &UserQuota) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.quotas.insert(quota.user_id, quota.clone());
        Ok(())
    }

    async fn replace_recommendations(&self, set: &RecommendationSet) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.recommendations.insert(set.user_id, set.clone());
        Ok(())
    }

    async fn get_recommendations(&self, user_id: Uuid) -> AppResult<Option<RecommendationSet>> {
        let inner = self.inner.read().await;
        Ok(inner.recommendations.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BrandTier, ItemDescription, PriceRange, ProductCandidate, ScoredProduct};

    fn sample_record(user_id: Uuid) -> SearchRecord {
        SearchRecord {
            id: Uuid::new_v4(),
            user_id,
            image_url: Some("https://img.example/original.jpg".to_string()),
            description: ItemDescription {
                item_type: "midi dress".to_string(),
                brand: None,
                style: "casual".to_string(),
                detailed_description: "A flowy blue midi dress".to_string(),
                colors: vec!["blue".to_string(), "white".to_string()],
                material: Some("cotton".to_string()),
                key_features: vec!["v-neck".to_string(), "midi length".to_string()],
                brand_tier: BrandTier::MidRange,
                season_occasion: "summer".to_string(),
                search_terms: vec!["blue midi dress".to_string()],
                price_estimate: Some(PriceRange {
                    low: 80.0,
                    high: 120.0,
                }),
            },
            products: vec![ScoredProduct {
                product: ProductCandidate {
                    id: "p1".to_string(),
                    title: "Blue Midi Dress".to_string(),
                    description: "Flowy summer dress".to_string(),
                    price: 42.0,
                    original_price: Some(60.0),
                    currency: "USD".to_string(),
                    image_url: "https://img.example/p1.jpg".to_string(),
                    merchant: "Dress Shop".to_string(),
                    link: "https://shop.example/p1".to_string(),
                    brand: None,
                    category: Some("midi dress".to_string()),
                },
                similarity_score: 87,
            }],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_search_record_round_trip() {
        let store = MemoryStore::new();
        let record = sample_record(Uuid::new_v4());

        store.insert_search(&record).await.unwrap();
        let loaded = store.get_search(record.id).await.unwrap().unwrap();

        // Field-for-field equality, including the ordered color/feature lists
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_recent_searches_newest_first() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let mut older = sample_record(user_id);
        older.created_at = Utc::now() - chrono::Duration::hours(2);
        let newer = sample_record(user_id);

        store.insert_search(&older).await.unwrap();
        store.insert_search(&newer).await.unwrap();

        let records = store.recent_searches(user_id, 10).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, newer.id);
    }

    #[tokio::test]
    async fn test_favorited_product_ids() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        for (product_id, kind) in [
            ("p1", EventKind::Favorite),
            ("p2", EventKind::View),
            ("p3", EventKind::Favorite),
        ] {
            store
                .append_interaction(&InteractionEvent {
                    user_id,
                    product_id: product_id.to_string(),
                    kind,
                    category: None,
                    price: None,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let favorited = store.favorited_product_ids(user_id).await.unwrap();
        assert_eq!(favorited.len(), 2);
        assert!(favorited.contains("p1"));
        assert!(favorited.contains("p3"));
    }

    #[tokio::test]
    async fn test_quota_round_trip_and_overwrite() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        assert!(store.get_quota(user_id).await.unwrap().is_none());

        let mut quota = UserQuota::new(user_id, Utc::now());
        quota.counter.count = 3;
        quota.premium = true;
        store.put_quota(&quota).await.unwrap();

        let loaded = store.get_quota(user_id).await.unwrap().unwrap();
        assert_eq!(loaded, quota);

        quota.counter.count = 4;
        store.put_quota(&quota).await.unwrap();
        let loaded = store.get_quota(user_id).await.unwrap().unwrap();
        assert_eq!(loaded.counter.count, 4);
    }

    #[tokio::test]
    async fn test_replace_recommendations_overwrites() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let first = RecommendationSet {
            user_id,
            products: vec![],
            generated_at: Utc::now() - chrono::Duration::hours(1),
        };
        let second = RecommendationSet {
            user_id,
            products: vec![],
            generated_at: Utc::now(),
        };

        store.replace_recommendations(&first).await.unwrap();
        store.replace_recommendations(&second).await.unwrap();

        let loaded = store.get_recommendations(user_id).await.unwrap().unwrap();
        assert_eq!(loaded.generated_at, second.generated_at);
    }
}
