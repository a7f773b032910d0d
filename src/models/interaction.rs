use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of a recorded user action against a product
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    View,
    Click,
    Favorite,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::View => "view",
            EventKind::Click => "click",
            EventKind::Favorite => "favorite",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "view" => Some(EventKind::View),
            "click" => Some(EventKind::Click),
            "favorite" => Some(EventKind::Favorite),
            _ => None,
        }
    }
}

/// Append-only record of one user action. Category and price are
/// denormalized from the product so the recommendation engine can
/// aggregate without joining back to a catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionEvent {
    pub user_id: Uuid,
    pub product_id: String,
    pub kind: EventKind,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Per-user free-tier usage within the current quota window. The window
/// starts at midnight UTC; crossing into a new UTC day resets the count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct UsageCounter {
    pub count: u32,
    pub window_start: DateTime<Utc>,
}

/// Durable per-user quota state: the usage counter plus the premium
/// entitlement recorded by the billing boundary. Stored so neither a
/// restart nor a redeploy resets counts or revokes premium.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserQuota {
    pub user_id: Uuid,
    pub counter: UsageCounter,
    pub premium: bool,
    /// Only meaningful while `premium` is true; None means no expiry
    pub premium_expires_at: Option<DateTime<Utc>>,
}

impl UserQuota {
    pub fn new(user_id: Uuid, window_start: DateTime<Utc>) -> Self {
        Self {
            user_id,
            counter: UsageCounter {
                count: 0,
                window_start,
            },
            premium: false,
            premium_expires_at: None,
        }
    }

    pub fn is_premium(&self, now: DateTime<Utc>) -> bool {
        self.premium && self.premium_expires_at.map_or(true, |expires| expires > now)
    }
}
