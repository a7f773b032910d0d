use crate::{
    error::AppResult,
    models::{BrandTier, ImagePayload, ItemDescription, PriceRange},
    services::vision::{validate_image, VisionAnalyzer},
};

const KNOWN_COLORS: [&str; 12] = [
    "black", "white", "red", "blue", "green", "yellow", "brown", "beige", "grey", "gray", "navy",
    "pink",
];

/// Deterministic analyzer for local development and tests: no network,
/// no API key. Image analysis returns a canned description; text
/// analysis derives one from the query so downstream scoring still has
/// signal to work with.
pub struct FixtureVision {
    canned: ItemDescription,
}

impl FixtureVision {
    pub fn new(canned: ItemDescription) -> Self {
        Self { canned }
    }

    fn describe_query(query: &str) -> ItemDescription {
        let lowered = query.to_lowercase();
        let colors: Vec<String> = KNOWN_COLORS
            .iter()
            .filter(|c| lowered.contains(*c))
            .map(|c| c.to_string())
            .collect();

        ItemDescription {
            item_type: query.to_string(),
            brand: None,
            style: "casual".to_string(),
            detailed_description: format!("Item matching the description: {}", query),
            colors,
            material: None,
            key_features: vec![],
            brand_tier: BrandTier::MidRange,
            season_occasion: "everyday".to_string(),
            search_terms: vec![query.to_string()],
            price_estimate: None,
        }
    }
}

impl Default for FixtureVision {
    fn default() -> Self {
        Self::new(ItemDescription {
            item_type: "sneakers".to_string(),
            brand: None,
            style: "athletic".to_string(),
            detailed_description: "White low-top sneakers with a rubber sole".to_string(),
            colors: vec!["white".to_string()],
            material: Some("leather".to_string()),
            key_features: vec!["low-top".to_string(), "lace-up".to_string()],
            brand_tier: BrandTier::MidRange,
            season_occasion: "everyday".to_string(),
            search_terms: vec!["white sneakers".to_string(), "low-top sneakers".to_string()],
            price_estimate: Some(PriceRange {
                low: 50.0,
                high: 90.0,
            }),
        })
    }
}

#[async_trait::async_trait]
impl VisionAnalyzer for FixtureVision {
    async fn analyze(&self, image: &ImagePayload) -> AppResult<ItemDescription> {
        validate_image(&image.bytes)?;
        Ok(self.canned.clone())
    }

    async fn analyze_text(&self, query: &str) -> AppResult<ItemDescription> {
        Ok(Self::describe_query(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_analyze_still_validates_the_image() {
        let vision = FixtureVision::default();
        let payload = ImagePayload {
            bytes: b"not an image".to_vec(),
            source_url: None,
        };
        assert!(vision.analyze(&payload).await.is_err());
    }

    #[tokio::test]
    async fn test_text_analysis_extracts_colors() {
        let vision = FixtureVision::default();
        let description = vision.analyze_text("navy blue wool coat").await.unwrap();
        assert!(description.colors.contains(&"navy".to_string()));
        assert!(description.colors.contains(&"blue".to_string()));
        assert_eq!(description.search_terms, vec!["navy blue wool coat"]);
    }
}
