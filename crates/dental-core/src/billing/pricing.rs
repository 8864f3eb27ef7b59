//! Standard treatment costs (INR).

use serde::{Deserialize, Serialize};

/// Minimum Jaro-Winkler score for a catalog suggestion.
pub const MIN_SUGGESTION_SCORE: f64 = 0.75;

const STANDARD_COSTS: &[(&str, f64)] = &[
    ("Consultation", 500.0),
    ("X-Ray", 300.0),
    ("Cleaning", 1000.0),
    ("Scaling", 1200.0),
    ("Filling", 1500.0),
    ("Extraction", 1500.0),
    ("Root Canal", 5000.0),
    ("Whitening", 5000.0),
    ("Crown", 8000.0),
    ("Veneer", 10000.0),
    ("Denture", 12000.0),
    ("Bridge", 15000.0),
    ("Implant", 25000.0),
    ("Braces", 40000.0),
];

/// A treatment type with its standard cost.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub label: String,
    pub cost: f64,
}

/// A catalog entry ranked against free-text input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostSuggestion {
    pub entry: CatalogEntry,
    pub score: f64,
}

/// Lookup table from treatment label to standard cost.
#[derive(Debug, Clone)]
pub struct TreatmentCatalog {
    entries: Vec<CatalogEntry>,
}

impl Default for TreatmentCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl TreatmentCatalog {
    /// The clinic's standard price list.
    pub fn standard() -> Self {
        Self::from_entries(
            STANDARD_COSTS
                .iter()
                .map(|(label, cost)| CatalogEntry {
                    label: (*label).to_string(),
                    cost: *cost,
                })
                .collect(),
        )
    }

    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Exact lookup, ignoring case and surrounding whitespace.
    pub fn standard_cost(&self, label: &str) -> Option<f64> {
        let key = normalize_label(label);
        self.entries
            .iter()
            .find(|e| normalize_label(&e.label) == key)
            .map(|e| e.cost)
    }

    /// Standard cost, or 0 for treatment types not in the catalog.
    pub fn cost_or_default(&self, label: &str) -> f64 {
        self.standard_cost(label).unwrap_or(0.0)
    }

    /// Rank catalog labels by similarity to free text, best first.
    pub fn suggest(&self, label: &str, limit: usize) -> Vec<CostSuggestion> {
        let key = normalize_label(label);
        if key.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<CostSuggestion> = self
            .entries
            .iter()
            .map(|entry| CostSuggestion {
                score: strsim::jaro_winkler(&key, &normalize_label(&entry.label)),
                entry: entry.clone(),
            })
            .filter(|s| s.score >= MIN_SUGGESTION_SCORE)
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(limit);
        ranked
    }
}

fn normalize_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_costs() {
        let catalog = TreatmentCatalog::standard();
        assert_eq!(catalog.standard_cost("Root Canal"), Some(5000.0));
        assert_eq!(catalog.standard_cost("  root   canal "), Some(5000.0));
        assert_eq!(catalog.standard_cost("x-ray"), Some(300.0));
        assert_eq!(catalog.standard_cost("Braces"), Some(40000.0));
    }

    #[test]
    fn test_unknown_type_defaults_to_zero() {
        let catalog = TreatmentCatalog::standard();
        assert_eq!(catalog.standard_cost("Gum Graft"), None);
        assert_eq!(catalog.cost_or_default("Gum Graft"), 0.0);
    }

    #[test]
    fn test_suggest_misspelling() {
        let catalog = TreatmentCatalog::standard();
        let suggestions = catalog.suggest("extracton", 3);
        assert!(!suggestions.is_empty());
        assert_eq!(suggestions[0].entry.label, "Extraction");
        assert!(suggestions.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_suggest_empty_input() {
        assert!(TreatmentCatalog::standard().suggest("   ", 5).is_empty());
    }
}
