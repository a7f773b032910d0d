//! Product catalog sources.
//!
//! A catalog source turns an analyzed item description into purchasable
//! candidates. The shopping-API provider is the production path; the
//! fixture source serves keyless development and tests.

use crate::{
    error::AppResult,
    models::{ItemDescription, ProductCandidate},
};

pub mod fixture;
pub mod shopping;

pub use fixture::FixtureCatalog;
pub use shopping::ShoppingCatalog;

/// Longest query the shopping API accepts
pub const MAX_QUERY_CHARS: usize = 100;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Returns between 0 and `limit` raw candidates for an item
    /// description; empty is a valid result. Ordering is the provider's;
    /// scoring and ranking happen downstream.
    async fn find_candidates(
        &self,
        description: &ItemDescription,
        limit: usize,
    ) -> AppResult<Vec<ProductCandidate>>;
}

/// Builds the shopping query from the strongest attributes: dominant
/// color, item type, and style, with an affordability nudge. Truncated
/// to the API's query limit on a character boundary.
pub fn build_query(description: &ItemDescription) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(color) = description.colors.first() {
        parts.push(color);
    }
    parts.push(&description.item_type);
    if !description.style.is_empty() {
        parts.push(&description.style);
    }
    parts.push("affordable");

    let query = parts.join(" ");
    if query.chars().count() <= MAX_QUERY_CHARS {
        query
    } else {
        query.chars().take(MAX_QUERY_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BrandTier;

    fn description(item_type: &str, colors: Vec<&str>, style: &str) -> ItemDescription {
        ItemDescription {
            item_type: item_type.to_string(),
            brand: None,
            style: style.to_string(),
            detailed_description: String::new(),
            colors: colors.into_iter().map(|c| c.to_string()).collect(),
            material: None,
            key_features: vec![],
            brand_tier: BrandTier::MidRange,
            season_occasion: String::new(),
            search_terms: vec![],
            price_estimate: None,
        }
    }

    #[test]
    fn test_build_query_uses_dominant_color_first() {
        let query = build_query(&description("midi dress", vec!["blue", "white"], "casual"));
        assert_eq!(query, "blue midi dress casual affordable");
    }

    #[test]
    fn test_build_query_without_colors_or_style() {
        let query = build_query(&description("sneakers", vec![], ""));
        assert_eq!(query, "sneakers affordable");
    }

    #[test]
    fn test_build_query_truncates_to_limit() {
        let long_type = "dress ".repeat(40);
        let query = build_query(&description(&long_type, vec!["blue"], "casual"));
        assert_eq!(query.chars().count(), MAX_QUERY_CHARS);
    }
}
