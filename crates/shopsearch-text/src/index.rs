use std::sync::Arc;
use std::time::Instant;

use shopsearch_core::catalog::Catalog;
use shopsearch_core::config::{SparseSettings, DEFAULT_MAX_FEATURES};
use shopsearch_core::traits::Retriever;
use shopsearch_core::types::{rank_positions, CatalogItem, RankedHit, SourceKind};

use crate::tfidf::TfIdfModel;

#[derive(Debug, Clone)]
pub struct SparseOptions {
	pub enabled: bool,
	pub max_features: usize,
}

impl Default for SparseOptions {
	fn default() -> Self { Self { enabled: true, max_features: DEFAULT_MAX_FEATURES } }
}

impl From<&SparseSettings> for SparseOptions {
	fn from(s: &SparseSettings) -> Self { Self { enabled: s.enabled, max_features: s.max_features } }
}

/// Lexical index over the catalog. `model` is `None` for the degraded no-op
/// index, whose queries always come back empty.
#[derive(Clone)]
pub struct SparseIndex {
	model: Option<TfIdfModel>,
	items: Vec<Arc<CatalogItem>>,
}

impl SparseIndex {
	pub fn build(catalog: &Catalog, options: &SparseOptions) -> Self {
		if !options.enabled {
			tracing::warn!("sparse retrieval disabled by configuration; using no-op index");
			return Self::disabled();
		}
		let start = Instant::now();
		let model = TfIdfModel::fit(&catalog.documents(), options.max_features.max(1));
		tracing::info!(
			docs = model.num_docs(),
			vocabulary = model.vocabulary_len(),
			elapsed_ms = start.elapsed().as_millis() as u64,
			"built TF-IDF index"
		);
		Self { model: Some(model), items: catalog.iter().cloned().collect() }
	}

	pub fn disabled() -> Self { Self { model: None, items: Vec::new() } }

	pub fn is_available(&self) -> bool { self.model.is_some() }

	pub fn len(&self) -> usize { self.items.len() }

	pub fn is_empty(&self) -> bool { self.items.is_empty() }

	pub fn vocabulary_len(&self) -> usize { self.model.as_ref().map_or(0, TfIdfModel::vocabulary_len) }

	/// Top `top_k` items by TF-IDF cosine similarity. Every item is a
	/// candidate, so items with no lexical overlap trail at score 0; ties keep
	/// catalog order.
	pub fn query(&self, text: &str, top_k: usize) -> Vec<RankedHit> {
		let Some(model) = &self.model else { return Vec::new() };
		if text.trim().is_empty() || top_k == 0 { return Vec::new(); }
		let scored: Vec<(usize, f32)> = model.similarities(text).into_iter().enumerate().collect();
		let hits = rank_positions(scored, top_k, SourceKind::Sparse, |pos| self.items.get(pos).cloned());
		tracing::debug!(query = text, hits = hits.len(), "sparse query");
		hits
	}
}

impl Retriever for SparseIndex {
	fn kind(&self) -> SourceKind { SourceKind::Sparse }
	fn is_available(&self) -> bool { self.model.is_some() }
	fn retrieve(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<RankedHit>> { Ok(self.query(query, top_k)) }
}
