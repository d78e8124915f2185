//! Nice-to-have scorer using embedding similarity.

/// Cosine similarity between two vectors. Returns 0.0 for mismatched or
/// zero-norm inputs rather than dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    dot / denom
}

/// Score the nice requirements from embedding similarities.
///
/// Similarities against the candidate summary vector are sorted descending,
/// the top `top_n` are averaged and remapped from [-1, 1] to [0, 1]. Absent
/// candidate vector or empty nice list scores 0.
pub fn nice_score(
    candidate: Option<&[f32]>,
    nice_embeddings: &[(String, Vec<f32>)],
    top_n: usize,
) -> f64 {
    let Some(candidate) = candidate else {
        tracing::info!("no candidate embedding, nice score is 0");
        return 0.0;
    };
    if nice_embeddings.is_empty() || top_n == 0 {
        return 0.0;
    }

    let mut similarities: Vec<f64> = nice_embeddings
        .iter()
        .map(|(_, vector)| cosine_similarity(candidate, vector))
        .collect();
    similarities.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    similarities.truncate(top_n);

    let mean = similarities.iter().sum::<f64>() / similarities.len() as f64;
    let score = ((mean + 1.0) / 2.0).clamp(0.0, 1.0);

    tracing::info!(score = score, considered = similarities.len(), "nice score computed");
    score
}
