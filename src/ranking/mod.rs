//! Ranking engine: embed, score, order.
//!
//! A single stateless pass per request. The query and every screen text are
//! embedded, each screen is scored with cosine similarity against the
//! query vector, and the full result set is returned sorted by score
//! descending. Nothing is cached between requests.

mod error;
mod types;


pub use error::RankingError;
pub use types::{RankedScreen, ScreenCandidate};

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, info};

use crate::embedding::MiniLmEmbedder;

/// Scores screens against advertiser text.
///
/// Holds a shared handle to the embedder; the engine itself has no state
/// between calls to [`rank`](Self::rank).
#[derive(Debug, Clone)]
pub struct RankingEngine {
    embedder: Arc<MiniLmEmbedder>,
}

impl RankingEngine {
    pub fn new(embedder: Arc<MiniLmEmbedder>) -> Self {
        Self { embedder }
    }

    /// Returns one [`RankedScreen`] per input screen, sorted by score
    /// descending.
    ///
    /// Guarantees:
    /// - output length equals input length; every id is echoed exactly once
    /// - screens are batched through the embedder in input order, so vector
    ///   `i` belongs to screen `i`
    /// - the sort is stable: equal scores keep their input order
    /// - a zero-magnitude vector scores 0.0 instead of producing NaN, so
    ///   the ordering stays total
    ///
    /// Any embedding failure fails the whole request; a partial ranking is
    /// never returned.
    pub fn rank(
        &self,
        advertiser_text: &str,
        screens: Vec<ScreenCandidate>,
    ) -> Result<Vec<RankedScreen>, RankingError> {
        debug!(
            query_len = advertiser_text.len(),
            screen_count = screens.len(),
            "Ranking screens"
        );

        let query_vec = self.embedder.embed(advertiser_text)?;

        let texts: Vec<&str> = screens.iter().map(|s| s.text.as_str()).collect();
        let screen_vecs = self.embedder.embed_batch(&texts)?;

        let mut results = Vec::with_capacity(screens.len());
        for (screen, vec) in screens.into_iter().zip(&screen_vecs) {
            if vec.len() != query_vec.len() {
                return Err(RankingError::DimensionMismatch {
                    expected: query_vec.len(),
                    actual: vec.len(),
                });
            }

            results.push(RankedScreen {
                screen_id: screen.id,
                score: cosine_similarity(&query_vec, vec),
            });
        }

        // Vec::sort_by is stable, which gives the tie-break guarantee above.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        info!(
            screen_count = results.len(),
            top_score = results.first().map(|r| r.score),
            "Ranking complete"
        );

        Ok(results)
    }

    /// Shared handle to the underlying embedder.
    pub fn embedder(&self) -> &Arc<MiniLmEmbedder> {
        &self.embedder
    }
}

/// Cosine similarity of two equal-length vectors.
///
/// Returns 0.0 when either vector has zero magnitude (the similarity is
/// undefined there; 0.0 keeps the ordering total and deterministic).
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let (dot, norm_a_sq, norm_b_sq) =
        a.iter()
            .zip(b.iter())
            .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (&av, &bv)| {
                (dot + av * bv, na + av * av, nb + bv * bv)
            });

    let norm_a = norm_a_sq.sqrt();
    let norm_b = norm_b_sq.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
