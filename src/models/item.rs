use serde::{Deserialize, Serialize};

/// Structured description of an analyzed item, produced by the vision
/// adapter. Immutable once created; owned by the search record that
/// produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemDescription {
    pub item_type: String,
    pub brand: Option<String>,
    pub style: String,
    pub detailed_description: String,
    pub colors: Vec<String>,
    pub material: Option<String>,
    pub key_features: Vec<String>,
    pub brand_tier: BrandTier,
    pub season_occasion: String,
    pub search_terms: Vec<String>,
    pub price_estimate: Option<PriceRange>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BrandTier {
    Luxury,
    MidRange,
    Budget,
    FastFashion,
}

impl BrandTier {
    /// Maps the provider's free-text tier onto the enum. The text is
    /// advisory, so unknown values fall back to mid-range rather than
    /// failing the whole analysis.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.to_lowercase();
        if raw.contains("luxury") || raw.contains("premium") {
            BrandTier::Luxury
        } else if raw.contains("fast") {
            BrandTier::FastFashion
        } else if raw.contains("budget") {
            BrandTier::Budget
        } else {
            BrandTier::MidRange
        }
    }
}

/// Estimated price band in the catalog's currency
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceRange {
    pub low: f64,
    pub high: f64,
}

impl PriceRange {
    /// Parses the provider's free-text estimate ("$80-120", "$80 - $120",
    /// "around $100"). Takes every number in the text: one number is a
    /// point estimate, two or more become the min/max band. Returns None
    /// when no number can be found.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut numbers = Vec::new();
        let mut current = String::new();

        let mut chars = raw.chars().peekable();
        while let Some(c) = chars.next() {
            if c.is_ascii_digit() || (c == '.' && !current.is_empty()) {
                current.push(c);
            } else if c == ','
                && !current.is_empty()
                && chars.peek().is_some_and(|next| next.is_ascii_digit())
            {
                // Thousands separator, not a number boundary ("$1,299")
            } else if !current.is_empty() {
                if let Ok(n) = current.parse::<f64>() {
                    numbers.push(n);
                }
                current.clear();
            }
        }
        if !current.is_empty() {
            if let Ok(n) = current.parse::<f64>() {
                numbers.push(n);
            }
        }

        match numbers.as_slice() {
            [] => None,
            [single] => Some(Self {
                low: *single,
                high: *single,
            }),
            rest => {
                let low = rest.iter().cloned().fold(f64::INFINITY, f64::min);
                let high = rest.iter().cloned().fold(0.0, f64::max);
                Some(Self { low, high })
            }
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.low && price <= self.high
    }
}

// ============================================================================
// Vision provider wire types
// ============================================================================

/// Raw JSON reply the vision provider is instructed to produce. Field
/// names are part of the provider contract; anything that does not parse
/// into this shape is a MalformedAnalysis.
#[derive(Debug, Clone, Deserialize)]
pub struct VisionReply {
    pub item_type: String,
    #[serde(default)]
    pub brand: Option<String>,
    pub style: String,
    pub detailed_description: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub estimated_brand_tier: String,
    #[serde(default)]
    pub season_occasion: String,
    #[serde(default)]
    pub search_terms: Vec<String>,
    #[serde(default)]
    pub price_estimate: String,
}

impl From<VisionReply> for ItemDescription {
    fn from(reply: VisionReply) -> Self {
        ItemDescription {
            brand_tier: BrandTier::parse(&reply.estimated_brand_tier),
            price_estimate: PriceRange::parse(&reply.price_estimate),
            item_type: reply.item_type,
            brand: reply.brand,
            style: reply.style,
            detailed_description: reply.detailed_description,
            colors: reply.colors,
            material: reply.material,
            key_features: reply.key_features,
            season_occasion: reply.season_occasion,
            search_terms: reply.search_terms,
        }
    }
}
