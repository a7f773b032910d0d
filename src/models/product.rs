use serde::{Deserialize, Serialize};

/// A catalog entry supplied by a product source. The pipeline only reads
/// these; the similarity score is attached separately.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductCandidate {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    /// Pre-discount price when the merchant reports one; price <= original
    pub original_price: Option<f64>,
    pub currency: String,
    pub image_url: String,
    pub merchant: String,
    pub link: String,
    pub brand: Option<String>,
    pub category: Option<String>,
}

/// A candidate with its computed similarity score (0-100). Within a result
/// set, ordering is score descending, ties by price ascending, then
/// catalog order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredProduct {
    #[serde(flatten)]
    pub product: ProductCandidate,
    pub similarity_score: u8,
}

// ============================================================================
// Shopping search API wire types
// ============================================================================

/// One entry of the shopping API's `shopping_results` array
#[derive(Debug, Clone, Deserialize)]
pub struct ShoppingItem {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub extracted_price: Option<f64>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub extracted_old_price: Option<f64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub product_link: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl ShoppingItem {
    /// Converts a raw result into a candidate, or None when it lacks both
    /// a link and a title (nothing actionable to show). `index` keeps ids
    /// unique when the API omits `product_id`.
    pub fn into_candidate(self, index: usize, category: &str) -> Option<ProductCandidate> {
        let title = self.title?;
        let link = self.product_link.or(self.link)?;

        // Prefer the numeric price; fall back to parsing the "$1,299.00" string
        let price = self
            .extracted_price
            .or_else(|| {
                self.price
                    .as_deref()
                    .map(|p| p.replace(['$', ','], ""))
                    .and_then(|p| p.trim().parse::<f64>().ok())
            })
            .unwrap_or(0.0);

        Some(ProductCandidate {
            id: self
                .product_id
                .unwrap_or_else(|| format!("shop_{}", index)),
            description: self.snippet.unwrap_or_default(),
            price,
            original_price: self.extracted_old_price,
            currency: "USD".to_string(),
            image_url: self.thumbnail.unwrap_or_default(),
            merchant: self.source.clone().unwrap_or_else(|| "Unknown".to_string()),
            link,
            brand: self.source,
            category: Some(category.to_string()),
            title,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_item() -> ShoppingItem {
        ShoppingItem {
            product_id: Some("p1".to_string()),
            title: Some("Blue Midi Dress".to_string()),
            snippet: Some("Flowy summer dress".to_string()),
            extracted_price: Some(42.0),
            price: None,
            extracted_old_price: Some(60.0),
            thumbnail: Some("https://img.example/p1.jpg".to_string()),
            source: Some("Dress Shop".to_string()),
            product_link: Some("https://shop.example/p1".to_string()),
            link: None,
        }
    }

    #[test]
    fn test_into_candidate_full() {
        let candidate = raw_item().into_candidate(0, "midi dress").unwrap();
        assert_eq!(candidate.id, "p1");
        assert_eq!(candidate.price, 42.0);
        assert_eq!(candidate.original_price, Some(60.0));
        assert_eq!(candidate.merchant, "Dress Shop");
        assert_eq!(candidate.category.as_deref(), Some("midi dress"));
    }

    #[test]
    fn test_into_candidate_parses_price_string() {
        let mut item = raw_item();
        item.extracted_price = None;
        item.price = Some("$1,299.00".to_string());
        let candidate = item.into_candidate(0, "watch").unwrap();
        assert_eq!(candidate.price, 1299.0);
    }

    #[test]
    fn test_into_candidate_missing_link_is_dropped() {
        let mut item = raw_item();
        item.product_link = None;
        item.link = None;
        assert!(item.into_candidate(0, "midi dress").is_none());
    }

    #[test]
    fn test_into_candidate_generates_id_from_index() {
        let mut item = raw_item();
        item.product_id = None;
        let candidate = item.into_candidate(7, "midi dress").unwrap();
        assert_eq!(candidate.id, "shop_7");
    }
}
