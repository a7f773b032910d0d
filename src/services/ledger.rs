use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::error;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{EventKind, InteractionEvent},
    store::Store,
};

/// Append-only record of user/product interactions. Recording is best
/// effort by contract: a failed write is reported and dropped so an
/// analytics hiccup never breaks the browsing flow that produced it.
pub struct InteractionLedger {
    store: Arc<dyn Store>,
}

impl InteractionLedger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn record(
        &self,
        user_id: Uuid,
        product_id: String,
        kind: EventKind,
        category: Option<String>,
        price: Option<f64>,
    ) {
        let event = InteractionEvent {
            user_id,
            product_id,
            kind,
            category,
            price,
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.append_interaction(&event).await {
            error!(
                error = %e,
                user_id = %event.user_id,
                product_id = %event.product_id,
                "Failed to record interaction"
            );
        }
    }

    /// Events for a user since `since`, newest first, capped at `max`
    pub async fn recent(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        max: usize,
    ) -> AppResult<Vec<InteractionEvent>> {
        self.store.recent_interactions(user_id, since, max).await
    }

    pub async fn favorited(&self, user_id: Uuid) -> AppResult<HashSet<String>> {
        self.store.favorited_product_ids(user_id).await
    }
}
