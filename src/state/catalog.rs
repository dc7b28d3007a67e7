//! Word catalog.
//!
//! A fixed, read-only list of word/hint entries partitioned into categories.
//! The crate only defines the shape and the sampling used during the picking
//! phase; the embedding server supplies the actual entries.

use rand::prelude::*;
use serde::Deserialize;

/// A single guessable word with its hint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub hint: String,
}

impl WordEntry {
    pub fn new(word: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            hint: hint.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "word": self.word,
            "hint": self.hint
        })
    }
}

/// A named group of entries.
#[derive(Debug, Clone, Deserialize)]
pub struct WordCategory {
    pub name: String,
    pub entries: Vec<WordEntry>,
}

/// The full catalog, flattened across categories for lookup and sampling.
#[derive(Debug, Clone, Default)]
pub struct WordCatalog {
    categories: Vec<WordCategory>,
}

impl WordCatalog {
    pub fn from_categories(categories: Vec<WordCategory>) -> Self {
        Self { categories }
    }

    /// Total entries across all categories.
    pub fn entry_count(&self) -> usize {
        self.categories.iter().map(|c| c.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    pub fn categories(&self) -> impl Iterator<Item = &WordCategory> {
        self.categories.iter()
    }

    /// Look up an entry by its exact canonical text.
    ///
    /// Used to validate catalog submissions; unknown words are not entries.
    pub fn find(&self, word: &str) -> Option<&WordEntry> {
        self.categories
            .iter()
            .flat_map(|c| c.entries.iter())
            .find(|e| e.word == word)
    }

    /// Sample up to `n` distinct words from the whole catalog.
    pub fn sample_choices(&self, n: usize) -> Vec<String> {
        self.sample_choices_with_rng(n, &mut rand::rng())
    }

    /// Sample with a caller-provided RNG.
    ///
    /// A catalog smaller than `n` yields every word it has.
    pub fn sample_choices_with_rng<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<String> {
        let all: Vec<&WordEntry> = self
            .categories
            .iter()
            .flat_map(|c| c.entries.iter())
            .collect();
        all.choose_multiple(rng, n)
            .map(|e| e.word.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_catalog() -> WordCatalog {
        WordCatalog::from_categories(vec![
            WordCategory {
                name: "heroes".to_string(),
                entries: vec![
                    WordEntry::new("Batman", "Wears a cape"),
                    WordEntry::new("Sherlock Holmes", "Detective"),
                ],
            },
            WordCategory {
                name: "items".to_string(),
                entries: vec![WordEntry::new("Toaster", "Kitchen appliance")],
            },
        ])
    }

    #[test]
    fn test_counts() {
        let catalog = make_catalog();
        assert_eq!(catalog.entry_count(), 3);
        assert!(!catalog.is_empty());
        assert!(WordCatalog::default().is_empty());
    }

    #[test]
    fn test_find_exact() {
        let catalog = make_catalog();
        assert_eq!(catalog.find("Batman").unwrap().hint, "Wears a cape");
        assert!(catalog.find("batman").is_none());
        assert!(catalog.find("Robin").is_none());
    }

    #[test]
    fn test_sample_distinct() {
        let catalog = make_catalog();
        let mut rng = StdRng::seed_from_u64(7);
        let choices = catalog.sample_choices_with_rng(2, &mut rng);
        assert_eq!(choices.len(), 2);
        assert_ne!(choices[0], choices[1]);
    }

    #[test]
    fn test_sample_short_catalog() {
        let catalog = make_catalog();
        let mut rng = StdRng::seed_from_u64(7);
        let choices = catalog.sample_choices_with_rng(10, &mut rng);
        assert_eq!(choices.len(), 3);
    }
}
