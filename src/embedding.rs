//! Sentence embeddings and cosine similarity.

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::hash::Hasher;
use std::sync::{Arc, Mutex};
use tracing::info;
use twox_hash::XxHash64;

use crate::config::{EmbeddingBackend, EmbeddingSettings};
use crate::error::{AssistantError, Result};

pub trait Embedder: Send + Sync {
    /// Embed every text, returning vectors in input order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| AssistantError::Embedding("No embedding generated".to_string()))
    }

    fn model_name(&self) -> &str;
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

/// all-MiniLM-L6-v2 through fastembed's ONNX runtime.
pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
}

impl FastEmbedder {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        let mut options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(settings.show_download_progress);
        if let Some(cache_dir) = settings.cache_path() {
            options = options.with_cache_dir(cache_dir);
        }
        let model = TextEmbedding::try_new(options)
            .map_err(|e| AssistantError::Embedding(format!("Failed to load model: {}", e)))?;
        info!("Loaded embedding model all-MiniLM-L6-v2");
        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl Embedder for FastEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = self
            .model
            .lock()
            .map_err(|_| AssistantError::Embedding("Embedding model lock poisoned".to_string()))?;
        model
            .embed(texts.to_vec(), None)
            .map_err(|e| AssistantError::Embedding(e.to_string()))
    }

    fn model_name(&self) -> &str {
        "all-MiniLM-L6-v2"
    }
}

/// Deterministic bag-of-words embedder that needs no model download.
///
/// Each lower-cased token is hashed into one bucket; the vector is
/// L2-normalized, so identical texts always score 1.0.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dimension];
        for token in text.split_whitespace() {
            let token: String = token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if token.is_empty() {
                continue;
            }
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(token.as_bytes());
            let idx = (hasher.finish() % self.dimension as u64) as usize;
            v[idx] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

impl Embedder for HashingEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn model_name(&self) -> &str {
        "hashing"
    }
}

/// Load the configured embedder once; it is shared read-only afterwards.
pub fn load_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    match settings.backend {
        EmbeddingBackend::FastEmbed => Ok(Arc::new(FastEmbedder::new(settings)?)),
        EmbeddingBackend::Hashing => {
            info!("Using hashing embedder ({} dims)", settings.hashing_dimension);
            Ok(Arc::new(HashingEmbedder::new(settings.hashing_dimension)))
        }
    }
}
