use std::sync::Arc;

use crate::embedding::MiniLmEmbedder;
use crate::ranking::RankingEngine;

/// Shared per-process state handed to every handler.
///
/// The embedder is loaded once at startup and injected here; handlers never
/// reach for globals, so tests substitute a stub embedder freely.
#[derive(Clone)]
pub struct HandlerState {
    pub engine: RankingEngine,
}

impl HandlerState {
    pub fn new(embedder: Arc<MiniLmEmbedder>) -> Self {
        Self {
            engine: RankingEngine::new(embedder),
        }
    }

    pub fn embedder(&self) -> &Arc<MiniLmEmbedder> {
        self.engine.embedder()
    }
}
