
use tracing::debug;

use crate::search::index::DocumentIndex;

/// Chunks scoring at or below this cosine similarity are never returned
pub const SIMILARITY_THRESHOLD: f64 = 0.2;

/// A chunk scored against a query embedding
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk<'a> {
    /// Position of the chunk in the index
    pub index: usize,
    pub similarity: f64,
    pub text: &'a str,
}

/// Cosine similarity of two vectors.
///
/// Vectors of different length, empty vectors and zero vectors all score 0.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot_product = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let norm_a = norm_a.sqrt();
    let norm_b = norm_b.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Chunks relevant to `query`, most similar first.
///
/// Ties keep index order. Only chunks scoring strictly above
/// [`SIMILARITY_THRESHOLD`] are returned; an empty result means nothing in the
/// index is relevant.
#[inline]
pub fn find_most_relevant_chunks<'a>(
    query: &[f32],
    index: &'a DocumentIndex,
) -> Vec<ScoredChunk<'a>> {
    rank_above(query, index, SIMILARITY_THRESHOLD)
}

fn rank_above<'a>(query: &[f32], index: &'a DocumentIndex, threshold: f64) -> Vec<ScoredChunk<'a>> {
    let mut scored: Vec<ScoredChunk<'a>> = index
        .chunks()
        .iter()
        .enumerate()
        .map(|(i, chunk)| ScoredChunk {
            index: i,
            similarity: cosine_similarity(query, &chunk.embedding),
            text: &chunk.text,
        })
        .collect();

    scored.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.index.cmp(&b.index))
    });

    scored.retain(|chunk| chunk.similarity > threshold);

    debug!(
        "{} of {} chunks above similarity threshold {}",
        scored.len(),
        index.len(),
        threshold
    );

    scored
}
