use std::path::PathBuf;

use crate::embedding::error::EmbeddingError;

/// Name of the sentence-transformers model this service embeds with.
pub const MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Output embedding dimension of MiniLM-L6 (hidden size, kept by mean
/// pooling).
pub const EMBEDDING_DIM: usize = 384;

/// Max tokens per input; longer texts are truncated.
pub const MAX_SEQ_LEN: usize = 256;

#[derive(Debug, Clone)]
/// Configuration for [`MiniLmEmbedder`](super::MiniLmEmbedder).
pub struct EmbedderConfig {
    /// Directory holding `config.json`, `model.safetensors` and
    /// `tokenizer.json`.
    pub model_dir: PathBuf,
    /// Max tokens to consider.
    pub max_seq_len: usize,
    /// Output embedding dimension.
    pub embedding_dim: usize,
    /// If true, run in deterministic stub mode (no model files required).
    pub testing_stub: bool,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::new(),
            max_seq_len: MAX_SEQ_LEN,
            embedding_dim: EMBEDDING_DIM,
            testing_stub: false,
        }
    }
}

impl EmbedderConfig {
    /// Creates a config for a model directory.
    pub fn new<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            model_dir: model_dir.into(),
            ..Default::default()
        }
    }

    /// Creates a stub config (no model files; produces deterministic
    /// embeddings).
    pub fn stub() -> Self {
        Self {
            testing_stub: true,
            ..Default::default()
        }
    }

    /// Validates required fields for non-stub mode.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.testing_stub {
            return Ok(());
        }

        if self.model_dir.as_os_str().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "model_dir is required (stubbing is disabled)".to_string(),
            });
        }

        if !self.model_dir.is_dir() {
            return Err(EmbeddingError::ModelNotFound {
                path: self.model_dir.clone(),
            });
        }

        Ok(())
    }

    /// Path to the model weights file.
    pub fn weights_path(&self) -> PathBuf {
        self.model_dir.join("model.safetensors")
    }

    /// Path to the BERT config file.
    pub fn config_path(&self) -> PathBuf {
        self.model_dir.join("config.json")
    }

    /// Path to `tokenizer.json`.
    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir.join("tokenizer.json")
    }
}
