//! Keyword substring categorizer.

use async_trait::async_trait;

use super::Categorizer;
use crate::config::CategorySpec;
use crate::error::CardfoldResult;

/// Files a meaning under the first category with a keyword occurring in it.
///
/// Matching is a case-insensitive substring test, so `"cat"` also matches
/// `"category"`.
pub struct KeywordCategorizer {
    /// (label, lowercased keywords) in configuration order.
    categories: Vec<(String, Vec<String>)>,
    fallback_label: String,
}

impl KeywordCategorizer {
    pub fn new(categories: &[CategorySpec], fallback_label: impl Into<String>) -> Self {
        let categories = categories
            .iter()
            .map(|spec| {
                let keywords = spec
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (spec.name.clone(), keywords)
            })
            .collect();

        Self {
            categories,
            fallback_label: fallback_label.into(),
        }
    }

    /// Synchronous lookup used by the trait impl.
    pub fn label_for(&self, meaning: &str) -> &str {
        let meaning = meaning.to_lowercase();
        self.categories
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| meaning.contains(k.as_str())))
            .map(|(label, _)| label.as_str())
            .unwrap_or(self.fallback_label.as_str())
    }
}

#[async_trait]
impl Categorizer for KeywordCategorizer {
    async fn categorize(&self, meaning: &str) -> CardfoldResult<String> {
        Ok(self.label_for(meaning).to_string())
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_categories;

    #[test]
    fn test_matches_keyword() {
        let categorizer = KeywordCategorizer::new(&default_categories(), "Uncategorized");
        assert_eq!(categorizer.label_for("a small dog"), "Animals");
        assert_eq!(categorizer.label_for("Fruit salad"), "Food");
        assert_eq!(categorizer.label_for("a garden tool"), "Objects");
    }

    #[test]
    fn test_first_match_wins() {
        // "cat food" matches both Animals and Food; Animals comes first.
        let categorizer = KeywordCategorizer::new(&default_categories(), "Uncategorized");
        assert_eq!(categorizer.label_for("cat food"), "Animals");

        let reversed: Vec<CategorySpec> = default_categories().into_iter().rev().collect();
        let categorizer = KeywordCategorizer::new(&reversed, "Uncategorized");
        assert_eq!(categorizer.label_for("cat food"), "Food");
    }

    #[test]
    fn test_fallback_when_nothing_matches() {
        let categorizer = KeywordCategorizer::new(&default_categories(), "Misc");
        assert_eq!(categorizer.label_for("happiness"), "Misc");
        assert_eq!(categorizer.label_for(""), "Misc");
    }

    #[tokio::test]
    async fn test_categorize_batch_preserves_order() {
        let categorizer = KeywordCategorizer::new(&default_categories(), "Uncategorized");
        let labels = categorizer
            .categorize_batch(&["snack".to_string(), "kitten".to_string(), "joy".to_string()])
            .await
            .unwrap();
        assert_eq!(labels, vec!["Food", "Animals", "Uncategorized"]);
    }
}
