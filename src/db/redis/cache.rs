use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;

use crate::error::AppError;
use crate::error::AppResult;

/// Keys for cached external lookups. Product searches are cached
/// aggressively (hours, not minutes) because every miss spends shopping
/// API quota.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Shopping API results for a normalized query string
    ProductSearch(String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::ProductSearch(query) => write!(f, "products:{}", query.to_lowercase()),
        }
    }
}

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Cache handler for storing and retrieving data from Redis
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
}

impl Cache {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }

    /// Retrieves a cached value by key, or None on a miss
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(format!("{}", key)).await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Stores a value without blocking the caller. The write happens in a
    /// spawned task; a failed write only loses the cache entry, so it is
    /// logged and dropped.
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let client = self.redis_client.clone();
        let key = format!("{}", key);
        tokio::spawn(async move {
            let result: AppResult<()> = async {
                let mut conn = client.get_multiplexed_async_connection().await?;
                let _: () = conn.set_ex(key.clone(), json, ttl).await?;
                Ok(())
            }
            .await;

            if let Err(e) = result {
                tracing::error!(error = %e, key = %key, "Failed to write to Redis cache");
            }
        });
    }
}
