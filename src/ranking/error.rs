use thiserror::Error;

use crate::embedding::EmbeddingError;

#[derive(Debug, Error)]
pub enum RankingError {
    /// The embedder could not produce a vector; the whole request fails.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Query and candidate vectors disagree on length. Always fatal: this
    /// is a defect in the embedder integration, not malformed input.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
