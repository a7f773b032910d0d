use crate::{
    error::AppResult,
    models::{ItemDescription, ProductCandidate},
    services::catalog::CatalogSource,
};

const MERCHANTS: [&str; 4] = ["Style Depot", "Thread & Co", "Urban Closet", "Fashion Direct"];
const VARIANTS: [&str; 6] = ["Classic", "Essential", "Premium", "Relaxed", "Slim Fit", "Vintage"];

/// Deterministic in-memory catalog for keyless development and tests.
/// Candidates are derived purely from the description, so identical
/// descriptions always yield identical candidates.
#[derive(Default)]
pub struct FixtureCatalog;

impl FixtureCatalog {
    fn candidate(description: &ItemDescription, index: usize, count: usize) -> ProductCandidate {
        let color = description
            .colors
            .get(index % description.colors.len().max(1))
            .map(String::as_str)
            .unwrap_or("neutral");
        let variant = VARIANTS[index % VARIANTS.len()];
        let merchant = MERCHANTS[index % MERCHANTS.len()];

        // Spread prices around the estimated band, or a default band
        let (low, high) = description
            .price_estimate
            .as_ref()
            .map(|band| (band.low, band.high))
            .unwrap_or((20.0, 120.0));
        let step = (high * 1.5 - low * 0.5) / count.max(1) as f64;
        let price = (low * 0.5 + step * index as f64).round();

        ProductCandidate {
            id: format!("fixture_{}", index),
            title: format!("{} {} {}", variant, color, description.item_type),
            description: format!(
                "{} {} in {}, {} style",
                variant, description.item_type, color, description.style
            ),
            price,
            original_price: (index % 3 == 0).then(|| (price * 1.3).round()),
            currency: "USD".to_string(),
            image_url: format!("https://img.fixture.test/{}.jpg", index),
            merchant: merchant.to_string(),
            link: format!("https://shop.fixture.test/products/{}", index),
            brand: Some(merchant.to_string()),
            category: Some(description.item_type.clone()),
        }
    }
}

#[async_trait::async_trait]
impl CatalogSource for FixtureCatalog {
    async fn find_candidates(
        &self,
        description: &ItemDescription,
        limit: usize,
    ) -> AppResult<Vec<ProductCandidate>> {
        Ok((0..limit)
            .map(|i| Self::candidate(description, i, limit))
            .collect())
    }
}
