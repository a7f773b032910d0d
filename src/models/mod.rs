pub mod interaction;
pub mod item;
pub mod product;

pub use interaction::{EventKind, InteractionEvent, UsageCounter, UserQuota};
pub use item::{BrandTier, ItemDescription, PriceRange, VisionReply};
pub use product::{ProductCandidate, ScoredProduct, ShoppingItem};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Decoded image bytes plus a stable reference to the stored original.
/// Intake validation and storage happen upstream; the pipeline only
/// re-checks what it depends on (size, image magic bytes).
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    /// Where the image came from, when the client supplied a reference
    pub source_url: Option<String>,
}

/// One completed visual search: the analyzed description and the ranked
/// matches. Created exactly once per successful search, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// None for text searches
    pub image_url: Option<String>,
    pub description: ItemDescription,
    pub products: Vec<ScoredProduct>,
    pub created_at: DateTime<Utc>,
}

/// Derived per-user feed. Fully replaced on every regeneration; it can
/// always be recomputed from the interaction and search history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationSet {
    pub user_id: Uuid,
    pub products: Vec<ScoredProduct>,
    pub generated_at: DateTime<Utc>,
}
