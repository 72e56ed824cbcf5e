use anyhow::{Result, bail, ensure};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Instant;

use shopsearch_core::catalog::Catalog;
use shopsearch_core::config::DenseSettings;
use shopsearch_core::traits::Embedder;
use shopsearch_core::types::CatalogItem;

#[derive(Debug, Clone)]
pub struct DenseBuildOptions {
    pub batch_size: usize,
    pub show_progress: bool,
}

impl Default for DenseBuildOptions {
    fn default() -> Self { Self { batch_size: 32, show_progress: false } }
}

impl From<&DenseSettings> for DenseBuildOptions {
    fn from(s: &DenseSettings) -> Self { Self { batch_size: s.batch_size, show_progress: s.show_progress } }
}

/// One unit-length embedding per catalog item, in catalog order.
pub struct DenseIndex {
    pub(crate) embedder: Arc<dyn Embedder>,
    pub(crate) vectors: Vec<Vec<f32>>,
    pub(crate) items: Vec<Arc<CatalogItem>>,
    pub(crate) dim: usize,
}

impl DenseIndex {
    pub fn build(embedder: Arc<dyn Embedder>, catalog: &Catalog, options: &DenseBuildOptions) -> Result<Self> {
        let dim = embedder.dim();
        ensure!(dim > 0, "embedder {} reports zero dimensions", embedder.id());
        let docs = catalog.documents();
        let start = Instant::now();
        tracing::info!(items = docs.len(), embedder = embedder.id(), "embedding catalog");

        let pb = options.show_progress.then(|| {
            let pb = ProgressBar::new(docs.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} items ({percent}%) {msg}") {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        });

        let mut vectors = Vec::with_capacity(docs.len());
        for batch in docs.chunks(options.batch_size.max(1)) {
            let embedded = embedder.embed_batch(batch)?;
            if embedded.len() != batch.len() {
                bail!("embedder {} returned {} vectors for {} documents", embedder.id(), embedded.len(), batch.len());
            }
            for v in embedded {
                vectors.push(normalize(v, dim)?);
            }
            if let Some(pb) = &pb { pb.inc(batch.len() as u64); }
        }
        if let Some(pb) = pb { pb.finish_with_message("catalog embedded"); }

        tracing::info!(items = vectors.len(), dim, elapsed_ms = start.elapsed().as_millis() as u64, "built dense index");
        Ok(Self { embedder, vectors, items: catalog.iter().cloned().collect(), dim })
    }

    pub fn len(&self) -> usize { self.vectors.len() }

    pub fn is_empty(&self) -> bool { self.vectors.is_empty() }

    pub fn dim(&self) -> usize { self.dim }

    pub fn embedder_id(&self) -> &str { self.embedder.id() }
}

/// Re-normalize to unit length. An all-zero vector (text with no usable tokens)
/// stays zero and simply never scores.
pub(crate) fn normalize(mut v: Vec<f32>, dim: usize) -> Result<Vec<f32>> {
    ensure!(v.len() == dim, "embedding has {} dimensions, expected {}", v.len(), dim);
    ensure!(v.iter().all(|x| x.is_finite()), "embedding contains non-finite values");
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 { for x in &mut v { *x /= norm; } }
    Ok(v)
}
