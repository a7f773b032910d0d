use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{EventKind, InteractionEvent, RecommendationSet, SearchRecord, UsageCounter, UserQuota},
    store::Store,
};

/// Postgres-backed store. The item description and product lists are
/// stored as serialized JSON text so reloading a record reproduces it
/// field for field.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn to_json<T: serde::Serialize>(value: &T) -> AppResult<String> {
        serde_json::to_string(value)
            .map_err(|e| AppError::Internal(format!("Record serialization error: {}", e)))
    }

    fn from_json<T: serde::de::DeserializeOwned>(json: &str) -> AppResult<T> {
        serde_json::from_str(json)
            .map_err(|e| AppError::Internal(format!("Record deserialization error: {}", e)))
    }

    fn row_to_search(row: &sqlx::postgres::PgRow) -> AppResult<SearchRecord> {
        Ok(SearchRecord {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            image_url: row.try_get("image_url")?,
            description: Self::from_json(row.try_get::<String, _>("description")?.as_str())?,
            products: Self::from_json(row.try_get::<String, _>("products")?.as_str())?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_interaction(row: &sqlx::postgres::PgRow) -> AppResult<InteractionEvent> {
        let kind: String = row.try_get("kind")?;
        Ok(InteractionEvent {
            user_id: row.try_get("user_id")?,
            product_id: row.try_get("product_id")?,
            kind: EventKind::parse(&kind)
                .ok_or_else(|| AppError::Internal(format!("Unknown event kind: {}", kind)))?,
            category: row.try_get("category")?,
            price: row.try_get("price")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn insert_search(&self, record: &SearchRecord) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO search_records (id, user_id, image_url, description, products, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.image_url)
        .bind(Self::to_json(&record.description)?)
        .bind(Self::to_json(&record.products)?)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_search(&self, id: Uuid) -> AppResult<Option<SearchRecord>> {
        let row = sqlx::query(
            "SELECT id, user_id, image_url, description, products, created_at
             FROM search_records WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::row_to_search(&r)).transpose()
    }

    async fn recent_searches(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<SearchRecord>> {
        let rows = sqlx::query(
            "SELECT id, user_id, image_url, description, products, created_at
             FROM search_records WHERE user_id = $1
             ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_search).collect()
    }

    async fn append_interaction(&self, event: &InteractionEvent) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO interaction_events (user_id, product_id, kind, category, price, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(event.user_id)
        .bind(&event.product_id)
        .bind(event.kind.as_str())
        .bind(&event.category)
        .bind(event.price)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent_interactions(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        max: usize,
    ) -> AppResult<Vec<InteractionEvent>> {
        let rows = sqlx::query(
            "SELECT user_id, product_id, kind, category, price, created_at
             FROM interaction_events
             WHERE user_id = $1 AND created_at >= $2
             ORDER BY created_at DESC LIMIT $3",
        )
        .bind(user_id)
        .bind(since)
        .bind(max as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_interaction).collect()
    }

    async fn favorited_product_ids(&self, user_id: Uuid) -> AppResult<HashSet<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT product_id FROM interaction_events
             WHERE user_id = $1 AND kind = 'favorite'",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| r.try_get::<String, _>("product_id").map_err(AppError::from))
            .collect()
    }

    async fn get_quota(&self, user_id: Uuid) -> AppResult<Option<UserQuota>> {
        let row = sqlx::query(
            "SELECT user_id, count, window_start, premium, premium_expires_at
             FROM user_quotas WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(UserQuota {
                user_id: r.try_get("user_id")?,
                counter: UsageCounter {
                    count: r.try_get::<i32, _>("count")?.max(0) as u32,
                    window_start: r.try_get("window_start")?,
                },
                premium: r.try_get("premium")?,
                premium_expires_at: r.try_get("premium_expires_at")?,
            })
        })
        .transpose()
    }

    async fn put_quota(&self, quota: &UserQuota) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO user_quotas (user_id, count, window_start, premium, premium_expires_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id) DO UPDATE
             SET count = EXCLUDED.count,
                 window_start = EXCLUDED.window_start,
                 premium = EXCLUDED.premium,
                 premium_expires_at = EXCLUDED.premium_expires_at",
        )
        .bind(quota.user_id)
        .bind(quota.counter.count as i32)
        .bind(quota.counter.window_start)
        .bind(quota.premium)
        .bind(quota.premium_expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn replace_recommendations(&self, set: &RecommendationSet) -> AppResult<()> {
        // Upsert gives the atomic full-replace the feed needs
        sqlx::query(
            "INSERT INTO recommendation_sets (user_id, products, generated_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id) DO UPDATE
             SET products = EXCLUDED.products, generated_at = EXCLUDED.generated_at",
        )
        .bind(set.user_id)
        .bind(Self::to_json(&set.products)?)
        .bind(set.generated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_recommendations(&self, user_id: Uuid) -> AppResult<Option<RecommendationSet>> {
        let row = sqlx::query(
            "SELECT user_id, products, generated_at FROM recommendation_sets WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(RecommendationSet {
                user_id: r.try_get("user_id")?,
                products: Self::from_json(r.try_get::<String, _>("products")?.as_str())?,
                generated_at: r.try_get("generated_at")?,
            })
        })
        .transpose()
    }
}
