use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::OnceLock;

use crate::error::{ClipwatchError, Result};

/// Text-to-vector capability consumed by the prompt store.
///
/// Implementations must be deterministic: the same text always yields the
/// same vector, so persisted prompt vectors stay valid across restarts.
pub trait TextEncoder: Send + Sync {
    /// Embed a single text into a fixed-length vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Whether the runtime is initialized and able to embed right now.
    /// When false, prompt creation is rejected and the store runs load-only.
    fn is_ready(&self) -> bool {
        true
    }

    /// Length of the vectors this encoder produces.
    fn dimension(&self) -> usize;
}

static MODEL: OnceLock<std::result::Result<TextEmbedding, String>> = OnceLock::new();

/// Encoder backed by a local fastembed model.
/// Uses lazy initialization to load the model on first use.
pub struct FastembedEncoder {
    model: &'static TextEmbedding,
}

impl FastembedEncoder {
    /// Create a new encoder with lazy model initialization.
    /// The embedding model (~50MB) is downloaded on first use.
    pub fn new() -> Result<Self> {
        let result = MODEL.get_or_init(|| {
            TextEmbedding::try_new(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
                .map_err(|e| e.to_string())
        });
        match result {
            Ok(model) => Ok(Self { model }),
            Err(e) => Err(ClipwatchError::Embedding(e.clone())),
        }
    }
}

impl TextEncoder for FastembedEncoder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.model.embed(vec![text], None)?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ClipwatchError::Embedding("No embedding returned".to_string()))
    }

    /// 384 for all-MiniLM-L6-v2.
    fn dimension(&self) -> usize {
        384
    }
}

impl From<fastembed::Error> for ClipwatchError {
    fn from(e: fastembed::Error) -> Self {
        ClipwatchError::Embedding(e.to_string())
    }
}
