//! Sentence-embedding backends for dense retrieval.
//!
//! `MiniLmEmbedder` runs a sentence-transformers BERT checkpoint (default
//! `all-MiniLM-L6-v2`) through candle; `HashEmbedder` is a deterministic,
//! model-free stand-in for tests and offline development.
use anyhow::{Context, Result, anyhow, ensure};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use shopsearch_core::config::{DenseSettings, EmbedBackend};
use shopsearch_core::traits::Embedder;

pub mod device;
pub mod pool;
pub mod tokenize;

pub use pool::masked_mean_l2;
pub use tokenize::tokenize_batch;

pub struct MiniLmEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    id: String,
    dim: usize,
    max_len: usize,
}

impl MiniLmEmbedder {
    pub fn load(model_dir: &Path, model_name: &str, max_len: usize) -> Result<Self> {
        let start = Instant::now();
        let device = device::select_device();
        tracing::info!(model = model_name, dir = %model_dir.display(), "loading sentence-embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        // Truncation and padding are applied per batch in `tokenize_batch`.
        tokenizer.with_padding(None);
        tokenizer.with_truncation(None).map_err(|e| anyhow!("Failed to reset truncation: {}", e))?;

        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(
            &std::fs::read_to_string(&config_path).with_context(|| format!("reading {}", config_path.display()))?,
        )
        .with_context(|| format!("parsing {}", config_path.display()))?;

        let safetensors = model_dir.join("model.safetensors");
        let vb = if safetensors.exists() {
            // SAFETY: the weights file is treated as read-only for the lifetime of the process.
            unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, &device)? }
        } else {
            let weights_path = model_dir.join("pytorch_model.bin");
            ensure!(weights_path.exists(), "no model.safetensors or pytorch_model.bin in {}", model_dir.display());
            let weights = candle_core::pickle::read_all(&weights_path)?;
            let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
            VarBuilder::from_tensors(weights_map, DType::F32, &device)
        };
        let model = BertModel::load(vb, &config).context("Failed to initialize BERT model from weights")?;

        let dim = config.hidden_size;
        let max_len = max_len.min(config.max_position_embeddings);
        let id = format!("minilm:{}:d{}", model_name, dim);
        tracing::info!(id = %id, elapsed_ms = start.elapsed().as_millis() as u64, "embedding model loaded");
        Ok(Self { model, tokenizer, device, id, dim, max_len })
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let (input_ids, attention_mask) = tokenize_batch(&self.tokenizer, texts, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let rows: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_dtype(DType::F32)?.to_vec2()?;
        Ok(rows)
    }
}

impl Embedder for MiniLmEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let out = self.embed_chunk(texts)?;
        tracing::debug!(batch = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(out)
    }
}

/// Token-hashing embedder: every lowercased alphanumeric token is hashed with
/// xxHash64 into one of `dim` buckets with a hash-derived sign, and the sum is
/// L2-normalized. Texts sharing tokens land close together.
pub struct HashEmbedder { dim: usize, id: String }

impl HashEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1), id: format!("hashing:xxh64:d{}", dim.max(1)) } }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::Hasher;
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(token.as_bytes());
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 { for x in &mut v { *x /= norm; } }
        v
    }
}

impl Embedder for HashEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

#[derive(Debug, Clone)]
pub struct EmbedderOptions {
    pub backend: EmbedBackend,
    pub model_name: String,
    pub model_dir: PathBuf,
    pub max_len: usize,
    pub hashing_dim: usize,
}

impl EmbedderOptions {
    /// `model_dir` is the already resolved model directory.
    pub fn from_settings(settings: &DenseSettings, model_dir: PathBuf) -> Self {
        Self {
            backend: settings.backend,
            model_name: settings.model_name.clone(),
            model_dir,
            max_len: settings.max_len,
            hashing_dim: settings.hashing_dim,
        }
    }
}

/// Load the configured backend. `APP_USE_FAKE_EMBEDDINGS=1` forces the hashing
/// backend regardless of configuration.
pub fn load_embedder(options: &EmbedderOptions) -> Result<Arc<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    if use_fake || options.backend == EmbedBackend::Hashing {
        tracing::info!(dim = options.hashing_dim, "using hashing embedder");
        return Ok(Arc::new(HashEmbedder::new(options.hashing_dim)));
    }
    let dir = resolve_model_dir(&options.model_dir, &options.model_name)?;
    Ok(Arc::new(MiniLmEmbedder::load(&dir, &options.model_name, options.max_len)?))
}

/// `APP_MODEL_DIR` wins, then the configured directory, then `../models/<name>`.
pub fn resolve_model_dir(configured: &Path, model_name: &str) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { tracing::debug!(dir = %p.display(), "using APP_MODEL_DIR"); return Ok(p); } }
    if configured.exists() { return Ok(configured.to_path_buf()); }
    let sibling = Path::new("../models").join(model_name);
    if sibling.exists() { tracing::debug!(dir = %sibling.display(), "using sibling model dir"); return Ok(sibling); }
    Err(anyhow!("Could not locate model directory for {} (tried {})", model_name, configured.display()))
}
