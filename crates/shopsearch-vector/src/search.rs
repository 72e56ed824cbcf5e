use anyhow::{Result, bail};

use shopsearch_core::traits::Retriever;
use shopsearch_core::types::{rank_positions, RankedHit, SourceKind};

use crate::index_build::{normalize, DenseIndex};

impl DenseIndex {
	/// Top `top_k` items by dot product with the query embedding. Every item is
	/// a candidate; ties keep catalog order.
	pub fn query(&self, text: &str, top_k: usize) -> Result<Vec<RankedHit>> {
		if text.trim().is_empty() || top_k == 0 || self.vectors.is_empty() { return Ok(Vec::new()); }
		let mut embedded = self.embedder.embed_batch(&[text.to_string()])?;
		let Some(q) = embedded.pop() else { bail!("embedder {} returned no vector for the query", self.embedder.id()) };
		let q = normalize(q, self.dim)?;
		let scored: Vec<(usize, f32)> = self.vectors.iter().map(|v| dot(&q, v)).enumerate().collect();
		let hits = rank_positions(scored, top_k, SourceKind::Dense, |pos| self.items.get(pos).cloned());
		tracing::debug!(query = text, hits = hits.len(), "dense query");
		Ok(hits)
	}
}

fn dot(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

impl Retriever for DenseIndex {
	fn kind(&self) -> SourceKind { SourceKind::Dense }
	fn is_available(&self) -> bool { true }
	fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RankedHit>> { self.query(query, top_k) }
}
