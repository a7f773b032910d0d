use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{InteractionEvent, RecommendationSet, SearchRecord, UserQuota},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Durable storage for the pipeline's records. The engine is external;
/// the pipeline only relies on these contracts: write-once inserts for
/// search records, append-only inserts for interaction events, and
/// full-replace semantics for recommendation sets.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Persists a completed search. Records are write-once.
    async fn insert_search(&self, record: &SearchRecord) -> AppResult<()>;

    /// Fetches a single search record by id
    async fn get_search(&self, id: Uuid) -> AppResult<Option<SearchRecord>>;

    /// Fetches a user's search history, newest first
    async fn recent_searches(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<SearchRecord>>;

    /// Appends one interaction event. Events are never updated or deleted.
    async fn append_interaction(&self, event: &InteractionEvent) -> AppResult<()>;

    /// Fetches a user's interaction events since the given instant,
    /// newest first, bounded by `max`
    async fn recent_interactions(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        max: usize,
    ) -> AppResult<Vec<InteractionEvent>>;

    /// Product ids the user has favorited, for feed deduplication
    async fn favorited_product_ids(&self, user_id: Uuid) -> AppResult<HashSet<String>>;

    /// Fetches the user's durable quota state, if any was recorded
    async fn get_quota(&self, user_id: Uuid) -> AppResult<Option<UserQuota>>;

    /// Upserts the user's quota state. Callers serialize the
    /// read-modify-write; the store only has to make the write atomic.
    async fn put_quota(&self, quota: &UserQuota) -> AppResult<()>;

    /// Atomically replaces the user's recommendation set
    async fn replace_recommendations(&self, set: &RecommendationSet) -> AppResult<()>;

    /// Fetches the user's current recommendation set, if any
    async fn get_recommendations(&self, user_id: Uuid) -> AppResult<Option<RecommendationSet>>;
}
