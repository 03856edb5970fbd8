//! Embedding similarity categorizer.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::vector::{cosine_similarity, is_zero, mean_vector};
use super::Categorizer;
use crate::config::CategorySpec;
use crate::error::{CardfoldError, CardfoldResult, ErrorCode};
use crate::traits::Embedder;

/// Picks the category whose averaged keyword embedding is closest to the
/// meaning's embedding.
///
/// Category embeddings are computed on first use. Categories without
/// keywords never win; they exist so the fallback label can also be a
/// declared category.
pub struct EmbeddingCategorizer {
    embedder: Arc<dyn Embedder>,
    categories: Vec<CategorySpec>,
    fallback_label: String,
    centroids: OnceCell<Vec<(String, Vec<f32>)>>,
}

impl EmbeddingCategorizer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        categories: Vec<CategorySpec>,
        fallback_label: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            categories,
            fallback_label: fallback_label.into(),
            centroids: OnceCell::new(),
        }
    }

    async fn centroids(&self) -> CardfoldResult<&[(String, Vec<f32>)]> {
        let centroids = self
            .centroids
            .get_or_try_init(|| async {
                let mut centroids = Vec::new();
                for category in &self.categories {
                    if category.keywords.is_empty() {
                        continue;
                    }
                    let embeddings = self.embedder.embed_batch(&category.keywords).await?;
                    let mean = mean_vector(&embeddings).ok_or_else(|| CardfoldError::Embedding {
                        message: format!(
                            "keyword embeddings for '{}' have inconsistent dimensions",
                            category.name
                        ),
                        code: ErrorCode::EmbDimensionMismatch,
                        source: None,
                    })?;
                    centroids.push((category.name.clone(), mean));
                }
                debug!(
                    categories = centroids.len(),
                    model = self.embedder.model_name(),
                    "Computed category embeddings"
                );
                Ok::<_, CardfoldError>(centroids)
            })
            .await?;
        Ok(centroids.as_slice())
    }

    /// Label with the highest cosine similarity; earlier categories win ties.
    /// Zero-length centroids never match.
    fn best_label<'a>(centroids: &'a [(String, Vec<f32>)], embedding: &[f32]) -> Option<&'a str> {
        let mut best: Option<(&str, f32)> = None;
        for (label, centroid) in centroids {
            if is_zero(centroid) {
                continue;
            }
            let similarity = cosine_similarity(embedding, centroid);
            match best {
                Some((_, top)) if similarity <= top => {}
                _ => best = Some((label.as_str(), similarity)),
            }
        }
        best.map(|(label, _)| label)
    }
}

#[async_trait]
impl Categorizer for EmbeddingCategorizer {
    async fn categorize(&self, meaning: &str) -> CardfoldResult<String> {
        // Left uninitialized on failure, so the next call retries.
        let centroids = match self.centroids().await {
            Ok(centroids) => centroids,
            Err(e) => {
                warn!(error = %e, "Category embeddings unavailable, using fallback label");
                return Ok(self.fallback_label.clone());
            }
        };
        if centroids.is_empty() {
            return Ok(self.fallback_label.clone());
        }

        let embedding = match self.embedder.embed(meaning).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(error = %e, meaning, "Embedding failed, using fallback label");
                return Ok(self.fallback_label.clone());
            }
        };

        if is_zero(&embedding) {
            debug!(meaning, "Zero-length embedding, using fallback label");
            return Ok(self.fallback_label.clone());
        }

        let label = Self::best_label(centroids, &embedding).unwrap_or(self.fallback_label.as_str());
        Ok(label.to_string())
    }

    fn name(&self) -> &'static str {
        "embedding"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps known words to fixed vectors; anything else fails or is zero.
    struct TableEmbedder {
        calls: AtomicUsize,
        fail_unknown: bool,
    }

    impl TableEmbedder {
        fn new(fail_unknown: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_unknown,
            }
        }
    }

    #[async_trait]
    impl Embedder for TableEmbedder {
        async fn embed(&self, text: &str) -> CardfoldResult<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let vector = match text {
                "dog" | "puppy" | "a loyal dog" => vec![1.0, 0.0, 0.0],
                "cat" => vec![0.9, 0.1, 0.0],
                "fruit" | "snack" | "ripe fruit" => vec![0.0, 1.0, 0.0],
                "between" => vec![1.0, 1.0, 0.0],
                _ if self.fail_unknown => return Err(CardfoldError::embedding("unknown text")),
                _ => vec![0.0, 0.0, 0.0],
            };
            Ok(vector)
        }

        fn dimension(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "table"
        }
    }

    fn categories() -> Vec<CategorySpec> {
        vec![
            CategorySpec::new("Animals", &["dog", "puppy", "cat"]),
            CategorySpec::new("Food", &["fruit", "snack"]),
            CategorySpec::new("Uncategorized", &[]),
        ]
    }

    #[tokio::test]
    async fn test_picks_most_similar_category() {
        let categorizer =
            EmbeddingCategorizer::new(Arc::new(TableEmbedder::new(true)), categories(), "Uncategorized");
        assert_eq!(categorizer.categorize("a loyal dog").await.unwrap(), "Animals");
        assert_eq!(categorizer.categorize("ripe fruit").await.unwrap(), "Food");
    }

    #[tokio::test]
    async fn test_ties_go_to_first_category() {
        let categories = vec![
            CategorySpec::new("First", &["dog"]),
            CategorySpec::new("Second", &["fruit"]),
        ];
        let categorizer =
            EmbeddingCategorizer::new(Arc::new(TableEmbedder::new(true)), categories, "Uncategorized");
        // [1,1,0] is equally close to [1,0,0] and [0,1,0].
        assert_eq!(categorizer.categorize("between").await.unwrap(), "First");
    }

    #[tokio::test]
    async fn test_embedding_failure_falls_back() {
        let categorizer =
            EmbeddingCategorizer::new(Arc::new(TableEmbedder::new(true)), categories(), "Uncategorized");
        assert_eq!(
            categorizer.categorize("something unknown").await.unwrap(),
            "Uncategorized"
        );
    }

    #[tokio::test]
    async fn test_no_keyword_categories_falls_back() {
        let categorizer = EmbeddingCategorizer::new(
            Arc::new(TableEmbedder::new(true)),
            vec![CategorySpec::new("Empty", &[])],
            "Misc",
        );
        assert_eq!(categorizer.categorize("a loyal dog").await.unwrap(), "Misc");
    }

    #[tokio::test]
    async fn test_category_embeddings_computed_once() {
        let embedder = Arc::new(TableEmbedder::new(false));
        let categorizer =
            EmbeddingCategorizer::new(embedder.clone(), categories(), "Uncategorized");

        categorizer.categorize("a loyal dog").await.unwrap();
        categorizer.categorize("ripe fruit").await.unwrap();

        // 5 keywords once, plus one call per meaning.
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn test_zero_embedding_falls_back() {
        let categorizer = EmbeddingCategorizer::new(
            Arc::new(TableEmbedder::new(false)),
            categories(),
            "Uncategorized",
        );
        // Unknown text embeds to [0,0,0], which is no closer to Animals than to Food.
        assert_eq!(
            categorizer.categorize("something unknown").await.unwrap(),
            "Uncategorized"
        );
    }

    #[tokio::test]
    async fn test_unavailable_category_embeddings_fall_back_and_retry() {
        let embedder = Arc::new(TableEmbedder::new(true));
        let categorizer = EmbeddingCategorizer::new(
            embedder.clone(),
            vec![
                CategorySpec::new("Broken", &["unheard-of"]),
                CategorySpec::new("Animals", &["dog"]),
            ],
            "Uncategorized",
        );

        assert_eq!(categorizer.categorize("a loyal dog").await.unwrap(), "Uncategorized");
        let after_first = embedder.calls.load(Ordering::SeqCst);
        assert_eq!(categorizer.categorize("a loyal dog").await.unwrap(), "Uncategorized");
        // The keyword embeddings were attempted again.
        assert!(embedder.calls.load(Ordering::SeqCst) > after_first);
    }
}
