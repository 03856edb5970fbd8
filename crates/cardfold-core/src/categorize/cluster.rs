//! TF-IDF + k-means categorizer.
//!
//! Labels only mean something within one batch: the cluster that contains
//! the first meaning of the batch is always `Cluster 1`, the next new
//! cluster encountered is `Cluster 2`, and so on. [`Categorizer::is_batch_label`]
//! reports this, so a later batch's `Cluster 1` gets its own folder rather
//! than joining an earlier one.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::vector::{l2_normalize, squared_distance};
use super::Categorizer;
use crate::error::CardfoldResult;

const MAX_ITERATIONS: usize = 100;

static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w{2,}").unwrap());

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any",
        "are", "as", "at", "be", "because", "been", "before", "being", "below", "between",
        "both", "but", "by", "can", "did", "do", "does", "doing", "down", "during", "each",
        "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here",
        "hers", "him", "his", "how", "if", "in", "into", "is", "it", "its", "itself", "just",
        "me", "more", "most", "my", "no", "nor", "not", "now", "of", "off", "on", "once",
        "only", "or", "other", "our", "out", "over", "own", "same", "she", "should", "so",
        "some", "such", "than", "that", "the", "their", "them", "then", "there", "these",
        "they", "this", "those", "through", "to", "too", "under", "until", "up", "very", "was",
        "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will",
        "with", "you", "your",
    ]
    .into_iter()
    .collect()
});

/// Groups a batch of meanings into at most `cluster_count` clusters.
pub struct ClusterCategorizer {
    cluster_count: usize,
    fallback_label: String,
}

impl ClusterCategorizer {
    pub fn new(cluster_count: usize, fallback_label: impl Into<String>) -> Self {
        Self {
            cluster_count: cluster_count.max(1),
            fallback_label: fallback_label.into(),
        }
    }

    /// Cluster index per meaning, `None` for meanings without usable terms.
    pub fn assign(&self, meanings: &[String]) -> Vec<Option<usize>> {
        let vectors = tfidf_vectors(meanings);
        let points: Vec<(usize, &Vec<f32>)> = vectors
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (i, v)))
            .collect();

        let mut result = vec![None; meanings.len()];
        if points.is_empty() {
            return result;
        }

        let data: Vec<&[f32]> = points.iter().map(|(_, v)| v.as_slice()).collect();
        let clusters = kmeans(&data, self.cluster_count.min(data.len()));

        // Renumber by first appearance so labels are stable across runs.
        let mut order: Vec<usize> = Vec::new();
        for ((index, _), cluster) in points.iter().zip(clusters) {
            let label = match order.iter().position(|&c| c == cluster) {
                Some(pos) => pos,
                None => {
                    order.push(cluster);
                    order.len() - 1
                }
            };
            result[*index] = Some(label);
        }

        debug!(
            meanings = meanings.len(),
            clusters = order.len(),
            "Clustered meanings"
        );
        result
    }

    fn label(&self, cluster: Option<usize>) -> String {
        match cluster {
            Some(id) => format!("Cluster {}", id + 1),
            None => self.fallback_label.clone(),
        }
    }
}

#[async_trait]
impl Categorizer for ClusterCategorizer {
    async fn categorize(&self, meaning: &str) -> CardfoldResult<String> {
        let assigned = self.assign(&[meaning.to_string()]);
        Ok(self.label(assigned[0]))
    }

    async fn categorize_batch(&self, meanings: &[String]) -> CardfoldResult<Vec<String>> {
        Ok(self
            .assign(meanings)
            .into_iter()
            .map(|cluster| self.label(cluster))
            .collect())
    }

    fn is_batch_label(&self, label: &str) -> bool {
        label != self.fallback_label
    }

    fn name(&self) -> &'static str {
        "cluster"
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !STOP_WORDS.contains(*t))
        .map(str::to_string)
        .collect()
}

/// L2-normalized TF-IDF vectors with smoothed idf, `None` for empty documents.
fn tfidf_vectors(docs: &[String]) -> Vec<Option<Vec<f32>>> {
    let tokens: Vec<Vec<String>> = docs.iter().map(|d| tokenize(d)).collect();

    let mut vocab: BTreeMap<&str, usize> = BTreeMap::new();
    for doc in &tokens {
        for term in doc {
            vocab.entry(term.as_str()).or_insert(0);
        }
    }
    for (index, slot) in vocab.values_mut().enumerate() {
        *slot = index;
    }

    let mut doc_freq = vec![0usize; vocab.len()];
    for doc in &tokens {
        let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
        for term in unique {
            doc_freq[vocab[term]] += 1;
        }
    }

    let n = docs.len() as f32;
    let idf: Vec<f32> = doc_freq
        .iter()
        .map(|&df| ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0)
        .collect();

    tokens
        .iter()
        .map(|doc| {
            let mut vector = vec![0.0f32; vocab.len()];
            for term in doc {
                vector[vocab[term.as_str()]] += 1.0;
            }
            for (x, w) in vector.iter_mut().zip(&idf) {
                *x *= w;
            }
            l2_normalize(&mut vector).then_some(vector)
        })
        .collect()
}

/// Lloyd's k-means with deterministic farthest-point seeding.
///
/// Returns a cluster index per point. Fewer than `k` clusters are used when
/// there are fewer distinct points.
fn kmeans(points: &[&[f32]], k: usize) -> Vec<usize> {
    let mut centers: Vec<Vec<f32>> = vec![points[0].to_vec()];
    while centers.len() < k {
        let (best, distance) = points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, nearest(&centers, p).1))
            .fold((0, 0.0f32), |acc, cur| if cur.1 > acc.1 { cur } else { acc });
        if distance <= f32::EPSILON {
            break;
        }
        centers.push(points[best].to_vec());
    }

    let mut assignment: Vec<usize> = points.iter().map(|p| nearest(&centers, p).0).collect();

    for _ in 0..MAX_ITERATIONS {
        for (c, center) in centers.iter_mut().enumerate() {
            let members: Vec<&&[f32]> = points
                .iter()
                .zip(&assignment)
                .filter(|(_, &a)| a == c)
                .map(|(p, _)| p)
                .collect();
            if members.is_empty() {
                continue;
            }
            let mut mean = vec![0.0f32; center.len()];
            for member in &members {
                for (acc, x) in mean.iter_mut().zip(member.iter()) {
                    *acc += x;
                }
            }
            let count = members.len() as f32;
            for acc in &mut mean {
                *acc /= count;
            }
            *center = mean;
        }

        let next: Vec<usize> = points.iter().map(|p| nearest(&centers, p).0).collect();
        if next == assignment {
            break;
        }
        assignment = next;
    }

    assignment
}

/// Index of and squared distance to the closest center; ties go to the lower index.
fn nearest(centers: &[Vec<f32>], point: &[f32]) -> (usize, f32) {
    centers
        .iter()
        .enumerate()
        .map(|(i, c)| (i, squared_distance(c, point)))
        .fold((0, f32::INFINITY), |acc, cur| if cur.1 < acc.1 { cur } else { acc })
}
