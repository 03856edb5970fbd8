//! Small dense-vector helpers shared by the categorizers.

/// Cosine similarity; 0.0 for empty, mismatched or zero-norm inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);

    if norm_a > f32::EPSILON && norm_b > f32::EPSILON {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

/// Euclidean length.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// True if the vector has no direction to compare against.
pub fn is_zero(v: &[f32]) -> bool {
    l2_norm(v) <= f32::EPSILON
}

/// Element-wise mean. `None` if the input is empty or dimensions differ.
pub fn mean_vector(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let dims = first.len();
    if vectors.iter().any(|v| v.len() != dims) {
        return None;
    }

    let mut mean = vec![0.0f32; dims];
    for vector in vectors {
        for (acc, x) in mean.iter_mut().zip(vector) {
            *acc += x;
        }
    }
    let n = vectors.len() as f32;
    for acc in &mut mean {
        *acc /= n;
    }
    Some(mean)
}

/// Squared Euclidean distance.
pub fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Scale to unit length in place. Returns false for a zero vector.
pub fn l2_normalize(v: &mut [f32]) -> bool {
    let norm = l2_norm(v);
    if norm <= f32::EPSILON {
        return false;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    true
}
