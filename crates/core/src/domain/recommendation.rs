//! Structured recommendation payload embedded in completion output.
//!
//! Field names mirror the wire format the front-end already parses
//! (`name` / `reason` / `price` / `tasteProfile`), so the re-serialized
//! object is a drop-in replacement for the model's raw JSON.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    #[serde(default)]
    pub summary: String,
    pub recommendations: Vec<RecommendedItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendedItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub price: String,
    #[serde(default, rename = "tasteProfile")]
    pub taste_profile: String,
}

impl RecommendationResult {
    /// True when any recommendation name contains the term, ignoring case.
    pub fn mentions(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.recommendations
            .iter()
            .any(|item| item.name.to_lowercase().contains(&needle))
    }
}
