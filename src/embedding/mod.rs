//! MiniLM sentence embedder (safetensors + tokenizer).
//!
//! Wraps the `all-MiniLM-L6-v2` sentence-transformers model: BERT forward
//! pass, attention-mask-weighted mean pooling, then L2 normalization.
//!
//! Use [`EmbedderConfig::stub`] for tests/deployments without model files.

/// Embedder configuration.
pub mod config;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;


pub use config::{EMBEDDING_DIM, EmbedderConfig, MAX_SEQ_LEN, MODEL_NAME};
pub use error::EmbeddingError;

use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};
use tracing::{debug, info, warn};

use device::select_device;

enum EmbedderBackend {
    Model {
        model: Arc<BertModel>,
        tokenizer: Arc<Tokenizer>,
        device: Device,
    },
    Stub,
}

/// Text-to-vector embedder shared read-only across requests.
///
/// `BertModel::forward` takes `&self`, so one instance can serve concurrent
/// requests without a lock.
pub struct MiniLmEmbedder {
    backend: EmbedderBackend,
    config: EmbedderConfig,
}

impl std::fmt::Debug for MiniLmEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniLmEmbedder")
            .field(
                "backend",
                &match &self.backend {
                    EmbedderBackend::Model { device, .. } => format!("Model({:?})", device),
                    EmbedderBackend::Stub => "Stub".to_string(),
                },
            )
            .field("embedding_dim", &self.config.embedding_dim)
            .field("max_seq_len", &self.config.max_seq_len)
            .finish()
    }
}

impl MiniLmEmbedder {
    /// Loads the embedder from a config (stub mode is supported).
    pub fn load(config: EmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if config.testing_stub {
            warn!("Embedder running in STUB mode (deterministic hash vectors)");
            return Ok(Self {
                backend: EmbedderBackend::Stub,
                config,
            });
        }

        let device = select_device()?;
        debug!(?device, "Selected compute device for embedder");

        let (model, tokenizer) = Self::load_model(&config, &device)?;

        info!(
            model_dir = %config.model_dir.display(),
            embedding_dim = config.embedding_dim,
            max_seq_len = config.max_seq_len,
            "Embedding model loaded"
        );

        Ok(Self {
            backend: EmbedderBackend::Model {
                model: Arc::new(model),
                tokenizer: Arc::new(tokenizer),
                device,
            },
            config,
        })
    }

    fn load_model(
        config: &EmbedderConfig,
        device: &Device,
    ) -> Result<(BertModel, Tokenizer), EmbeddingError> {
        let bert_config: BertConfig =
            serde_json::from_str(&std::fs::read_to_string(config.config_path())?).map_err(
                |e| EmbeddingError::ModelLoadFailed {
                    reason: format!("Failed to parse config.json: {}", e),
                },
            )?;

        if bert_config.hidden_size != config.embedding_dim {
            return Err(EmbeddingError::InvalidConfig {
                reason: format!(
                    "embedding_dim ({}) does not match model hidden_size ({})",
                    config.embedding_dim, bert_config.hidden_size
                ),
            });
        }

        let weights_path = config.weights_path();
        if !weights_path.exists() {
            return Err(EmbeddingError::ModelNotFound { path: weights_path });
        }

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, device)?
        };
        let model = BertModel::load(vb, &bert_config).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to load BERT weights: {}", e),
            }
        })?;

        let mut tokenizer = Tokenizer::from_file(config.tokenizer_path()).map_err(|e| {
            EmbeddingError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            }
        })?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_seq_len,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::TokenizationFailed {
                reason: format!("Failed to configure truncation: {}", e),
            })?;
        tokenizer.with_padding(Some(PaddingParams::default()));

        Ok((model, tokenizer))
    }

    /// Generates an embedding for a single string.
    ///
    /// Deterministic for identical input; the result is L2-normalized.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match &self.backend {
            EmbedderBackend::Model {
                model,
                tokenizer,
                device,
            } => {
                let mut vectors = Self::forward_batch(
                    &[text],
                    model,
                    tokenizer,
                    device,
                    self.config.embedding_dim,
                )?;
                Ok(vectors.remove(0))
            }
            EmbedderBackend::Stub => Ok(self.embed_stub(text)),
        }
    }

    /// Generates embeddings for a batch of strings.
    ///
    /// Output order matches input order: vector `i` belongs to `texts[i]`.
    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        match &self.backend {
            EmbedderBackend::Model {
                model,
                tokenizer,
                device,
            } => Self::forward_batch(texts, model, tokenizer, device, self.config.embedding_dim),
            EmbedderBackend::Stub => Ok(texts.iter().map(|text| self.embed_stub(text)).collect()),
        }
    }

    /// Tokenizes, runs one padded forward pass, mean-pools over the
    /// attention mask and L2-normalizes each row.
    fn forward_batch(
        texts: &[&str],
        model: &BertModel,
        tokenizer: &Tokenizer,
        device: &Device,
        embedding_dim: usize,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let encodings = tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::TokenizationFailed {
                reason: e.to_string(),
            })?;

        debug!(
            batch_size = texts.len(),
            seq_len = encodings.first().map(|e| e.get_ids().len()),
            "Generating embeddings (BERT forward pass)"
        );

        let token_ids = encodings
            .iter()
            .map(|e| Tensor::new(e.get_ids(), device))
            .collect::<Result<Vec<_>, _>>()?;
        let input_ids = Tensor::stack(&token_ids, 0)?;

        let type_ids = encodings
            .iter()
            .map(|e| Tensor::new(e.get_type_ids(), device))
            .collect::<Result<Vec<_>, _>>()?;
        let token_type_ids = Tensor::stack(&type_ids, 0)?;

        let masks = encodings
            .iter()
            .map(|e| Tensor::new(e.get_attention_mask(), device))
            .collect::<Result<Vec<_>, _>>()?;
        let attention_mask = Tensor::stack(&masks, 0)?;

        // [batch, seq_len, hidden]
        let hidden = model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // Mean pooling weighted by the attention mask, the
        // sentence-transformers convention for this model.
        let mask = attention_mask.to_dtype(DType::F32)?;
        let mask_expanded = mask.unsqueeze(2)?.broadcast_as(hidden.shape())?;
        let summed = hidden.mul(&mask_expanded)?.sum(1)?;
        let counts = mask.sum_keepdim(1)?;
        let pooled = summed.broadcast_div(&counts)?;

        let rows = pooled.to_vec2::<f32>()?;

        Ok(rows
            .into_iter()
            .map(|row| {
                debug_assert_eq!(row.len(), embedding_dim);
                normalize(row)
            })
            .collect())
    }

    fn embed_stub(&self, text: &str) -> Vec<f32> {
        use std::hash::{DefaultHasher, Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();

        let mut embedding = Vec::with_capacity(self.config.embedding_dim);
        let mut state = seed;

        for _ in 0..self.config.embedding_dim {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            embedding.push(value);
        }

        normalize(embedding)
    }

    /// Returns the configured output embedding dimension.
    pub fn embedding_dim(&self) -> usize {
        self.config.embedding_dim
    }

    /// Returns the name of the active model, for the health surface.
    pub fn model_name(&self) -> &'static str {
        MODEL_NAME
    }

    /// Returns `true` if running in stub mode.
    pub fn is_stub(&self) -> bool {
        matches!(self.backend, EmbedderBackend::Stub)
    }

    /// Returns the embedder configuration.
    pub fn config(&self) -> &EmbedderConfig {
        &self.config
    }
}

fn normalize(mut embedding: Vec<f32>) -> Vec<f32> {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm > 0.0 {
        for x in &mut embedding {
            *x /= norm;
        }
    }

    embedding
}
