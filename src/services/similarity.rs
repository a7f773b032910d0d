use std::collections::HashSet;

use crate::models::{ItemDescription, ProductCandidate, ScoredProduct};

/// Result sets are truncated to this many products before returning
pub const MAX_RESULTS: usize = 20;

// Sub-signal weights; they sum to 1.0
const WEIGHT_CATEGORY: f64 = 0.35;
const WEIGHT_COLOR: f64 = 0.25;
const WEIGHT_KEYWORDS: f64 = 0.25;
const WEIGHT_PRICE: f64 = 0.15;

/// Computes the similarity between an analyzed item and one catalog
/// candidate as an integer in [0, 100].
///
/// Pure function of its two inputs: identical inputs always produce the
/// identical score. Four sub-signals, each normalized to [0, 1], are
/// combined by fixed weights: category match, color overlap, keyword and
/// style overlap, and price-band proximity. Price proximity only counts
/// once at least one of the other signals is nonzero, so a candidate with
/// no attributes in common scores exactly 0.
pub fn score(description: &ItemDescription, candidate: &ProductCandidate) -> u8 {
    let candidate_tokens = candidate_tokens(candidate);

    let category = category_signal(description, candidate, &candidate_tokens);
    let color = overlap_signal(&description.colors, &candidate_tokens);
    let keywords = keyword_signal(description, &candidate_tokens);

    if category == 0.0 && color == 0.0 && keywords == 0.0 {
        return 0;
    }

    let price = price_signal(description, candidate.price);

    let weighted = WEIGHT_CATEGORY * category
        + WEIGHT_COLOR * color
        + WEIGHT_KEYWORDS * keywords
        + WEIGHT_PRICE * price;

    (weighted * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Scores, orders, and truncates a candidate list. Ordering: score
/// descending, ties broken by lower price, remaining ties keep catalog
/// order (the sort is stable).
pub fn rank(
    description: &ItemDescription,
    candidates: Vec<ProductCandidate>,
    top_n: usize,
) -> Vec<ScoredProduct> {
    let mut scored: Vec<ScoredProduct> = candidates
        .into_iter()
        .map(|product| ScoredProduct {
            similarity_score: score(description, &product),
            product,
        })
        .collect();

    scored.sort_by(|a, b| {
        b.similarity_score.cmp(&a.similarity_score).then(
            a.product
                .price
                .partial_cmp(&b.product.price)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });
    scored.truncate(top_n);
    scored
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(|t| t.to_string())
        .collect()
}

fn candidate_tokens(candidate: &ProductCandidate) -> HashSet<String> {
    let mut tokens: HashSet<String> = tokenize(&candidate.title).into_iter().collect();
    tokens.extend(tokenize(&candidate.description));
    if let Some(category) = &candidate.category {
        tokens.extend(tokenize(category));
    }
    if let Some(brand) = &candidate.brand {
        tokens.extend(tokenize(brand));
    }
    tokens
}

/// Fraction of the item-type tokens present in the candidate. An exact
/// category label match short-circuits to 1.0.
fn category_signal(
    description: &ItemDescription,
    candidate: &ProductCandidate,
    candidate_tokens: &HashSet<String>,
) -> f64 {
    if let Some(category) = &candidate.category {
        if category.eq_ignore_ascii_case(&description.item_type) {
            return 1.0;
        }
    }

    token_fraction(&tokenize(&description.item_type), candidate_tokens)
}

/// Fraction of the description's colors that show up in the candidate
fn overlap_signal(colors: &[String], candidate_tokens: &HashSet<String>) -> f64 {
    let color_tokens: Vec<String> = colors.iter().flat_map(|c| tokenize(c)).collect();
    token_fraction(&color_tokens, candidate_tokens)
}

/// Overlap across search terms, style, and key features
fn keyword_signal(description: &ItemDescription, candidate_tokens: &HashSet<String>) -> f64 {
    let mut keywords: Vec<String> = tokenize(&description.style);
    for term in &description.search_terms {
        keywords.extend(tokenize(term));
    }
    for feature in &description.key_features {
        keywords.extend(tokenize(feature));
    }
    token_fraction(&keywords, candidate_tokens)
}

fn token_fraction(wanted: &[String], present: &HashSet<String>) -> f64 {
    let unique: HashSet<&String> = wanted.iter().collect();
    if unique.is_empty() {
        return 0.0;
    }
    let hits = unique.iter().filter(|t| present.contains(**t)).count();
    hits as f64 / unique.len() as f64
}

/// 1.0 inside the estimated band, linear falloff with distance outside it,
/// 0 when either side has no usable price
fn price_signal(description: &ItemDescription, price: f64) -> f64 {
    let Some(band) = &description.price_estimate else {
        return 0.0;
    };
    if price <= 0.0 || band.high <= 0.0 {
        return 0.0;
    }
    if band.contains(price) {
        return 1.0;
    }

    let nearest = if price < band.low { band.low } else { band.high };
    let distance = (price - nearest).abs();
    (1.0 - distance / nearest).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BrandTier, PriceRange};

    fn dress_description() -> ItemDescription {
        ItemDescription {
            item_type: "midi dress".to_string(),
            brand: None,
            style: "casual".to_string(),
            detailed_description: "A flowy blue midi dress".to_string(),
            colors: vec!["blue".to_string()],
            material: Some("cotton".to_string()),
            key_features: vec![],
            brand_tier: BrandTier::MidRange,
            season_occasion: "summer".to_string(),
            search_terms: vec!["blue midi dress".to_string()],
            price_estimate: Some(PriceRange {
                low: 80.0,
                high: 120.0,
            }),
        }
    }

    fn candidate(id: &str, title: &str, price: f64) -> ProductCandidate {
        ProductCandidate {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            price,
            original_price: None,
            currency: "USD".to_string(),
            image_url: String::new(),
            merchant: "Shop".to_string(),
            link: "https://shop.example".to_string(),
            brand: None,
            category: None,
        }
    }

    #[test]
    fn test_score_is_deterministic_and_in_range() {
        let description = dress_description();
        let product = candidate("p1", "Blue Midi Dress", 90.0);

        let first = score(&description, &product);
        for _ in 0..10 {
            assert_eq!(score(&description, &product), first);
        }
        assert!(first <= 100);
    }

    #[test]
    fn test_no_overlap_scores_zero() {
        let description = dress_description();
        // Price sits inside the band, but nothing else matches
        let product = candidate("p1", "Cordless Drill", 100.0);
        assert_eq!(score(&description, &product), 0);
    }

    #[test]
    fn test_perfect_match_scores_high() {
        let description = dress_description();
        let mut product = candidate("p1", "Casual Blue Midi Dress", 100.0);
        product.category = Some("midi dress".to_string());
        assert!(score(&description, &product) >= 90);
    }

    #[test]
    fn test_color_match_outweighs_price_proximity() {
        // The $40 high-color-match candidate must rank above the $150
        // low-color-match candidate even though price proximity alone
        // would favor the $90 item over the $40 one.
        let description = dress_description();
        let cheap_match = candidate("cheap", "Blue Midi Dress", 40.0);
        let mid_plain = candidate("mid", "Midi Dress", 90.0);
        let pricey_plain = candidate("pricey", "Midi Dress", 150.0);

        let ranked = rank(
            &description,
            vec![pricey_plain, mid_plain, cheap_match],
            MAX_RESULTS,
        );

        assert_eq!(ranked[0].product.id, "cheap");
        let pricey_rank = ranked.iter().position(|p| p.product.id == "pricey").unwrap();
        let cheap_rank = ranked.iter().position(|p| p.product.id == "cheap").unwrap();
        assert!(cheap_rank < pricey_rank);
    }

    #[test]
    fn test_equal_scores_break_ties_by_price() {
        let description = dress_description();
        let expensive = candidate("expensive", "Blue Midi Dress", 110.0);
        let cheap = candidate("cheap", "Blue Midi Dress", 85.0);

        assert_eq!(
            score(&description, &expensive),
            score(&description, &cheap)
        );

        let ranked = rank(&description, vec![expensive, cheap], MAX_RESULTS);
        assert_eq!(ranked[0].product.id, "cheap");
        assert_eq!(ranked[1].product.id, "expensive");
    }

    #[test]
    fn test_full_ties_keep_catalog_order() {
        let description = dress_description();
        let first = candidate("first", "Blue Midi Dress", 90.0);
        let second = candidate("second", "Blue Midi Dress", 90.0);

        let ranked = rank(&description, vec![first, second], MAX_RESULTS);
        assert_eq!(ranked[0].product.id, "first");
        assert_eq!(ranked[1].product.id, "second");
    }

    #[test]
    fn test_rank_truncates_to_top_n() {
        let description = dress_description();
        let candidates: Vec<ProductCandidate> = (0..30)
            .map(|i| candidate(&format!("p{}", i), "Blue Midi Dress", 50.0 + i as f64))
            .collect();

        let ranked = rank(&description, candidates, MAX_RESULTS);
        assert_eq!(ranked.len(), MAX_RESULTS);
    }

    #[test]
    fn test_missing_price_band_still_scores_other_signals() {
        let mut description = dress_description();
        description.price_estimate = None;
        let product = candidate("p1", "Blue Midi Dress", 40.0);
        assert!(score(&description, &product) > 0);
    }
}
