//! Memory reflectors: rank stored memories against a query vector and
//! resurface the best few into the prompt.

pub mod poetic;
pub mod symbolic;

use crate::embed::cosine_similarity;

/// Rank candidates by cosine similarity to `query` plus a per-candidate
/// boost, descending, and keep the top `k`.
///
/// Candidates whose embedding is empty are excluded from ranking entirely
/// rather than scored as zero. The sort is stable, so equal totals keep
/// their scan order.
pub fn rank<T>(
    query: &[f32],
    candidates: Vec<(T, f32)>,
    embedding: impl Fn(&T) -> &[f32],
    k: usize,
) -> Vec<T> {
    let mut scored: Vec<(T, f32)> = candidates
        .into_iter()
        .filter(|(item, _)| !embedding(item).is_empty())
        .map(|(item, boost)| {
            let similarity = cosine_similarity(query, embedding(&item));
            (item, similarity + boost)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored.into_iter().map(|(item, _)| item).collect()
}
