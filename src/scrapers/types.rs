use serde::{Deserialize, Serialize};

/// Search filters for listing scraping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    /// Free-text product name or model
    pub query: String,
    /// Top-level category, e.g. "Informatique et Multimedias"
    pub category: String,
    /// Subcategory, e.g. "Téléphones"
    pub subcategory: String,
    /// City or governorate
    pub city: Option<String>,
    /// Product condition ("Neuf", "Occasion")
    pub condition: Option<String>,
    /// Minimum price (DT)
    pub min_price: Option<u64>,
    /// Maximum price (DT)
    pub max_price: Option<u64>,
}

impl SearchParams {
    /// Build the search URL for one results page under `base`.
    ///
    /// Path segments appear in the fixed order category, subcategory, city,
    /// condition, query; empty values contribute nothing. Page 0 is omitted.
    pub fn build_url(&self, base: &str, page: u32) -> String {
        let segments: Vec<String> = [
            ("c/", Some(self.category.as_str())),
            ("", Some(self.subcategory.as_str())),
            ("l/", self.city.as_deref()),
            ("t/", self.condition.as_deref()),
            ("k/", Some(self.query.as_str())),
        ]
        .into_iter()
        .filter_map(|(prefix, value)| {
            value
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}{}", prefix, urlencoding::encode(v)))
        })
        .collect();

        let base = base.trim_end_matches('/');
        let mut url = if segments.is_empty() {
            format!("{}/", base)
        } else {
            format!("{}/{}/", base, segments.join("/"))
        };

        let mut params = Vec::new();
        if let Some(min) = self.min_price {
            params.push(format!("minPrice={}", min));
        }
        if let Some(max) = self.max_price {
            params.push(format!("maxPrice={}", max));
        }
        if page > 0 {
            params.push(format!("page={}", page));
        }

        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }

        url
    }
}
