//! Screenrank library crate (used by the server binary and integration tests).
//!
//! Screenrank ranks advertising screens by semantic relevance to a piece of
//! advertiser text. The pipeline is a single stateless pass per request:
//!
//! 1. [`gateway::validate`] checks the structural preconditions on the raw
//!    payload before any embedding work runs.
//! 2. [`RankingEngine`] embeds the query and every screen text, scores each
//!    screen with cosine similarity, and returns the full result set in
//!    stable descending score order.
//!
//! The embedding model ([`MiniLmEmbedder`]) is loaded once at startup and
//! shared read-only across requests. A deterministic stub backend
//! ([`EmbedderConfig::stub`]) substitutes for the real model in tests and
//! model-less deployments.

pub mod config;
pub mod embedding;
pub mod gateway;
pub mod ranking;

pub use config::{Config, ConfigError};
pub use embedding::{
    EMBEDDING_DIM, EmbedderConfig, EmbeddingError, MAX_SEQ_LEN, MODEL_NAME, MiniLmEmbedder,
};
pub use gateway::{HandlerState, create_router_with_state};
pub use ranking::{
    RankedScreen, RankingEngine, RankingError, ScreenCandidate, cosine_similarity,
};
