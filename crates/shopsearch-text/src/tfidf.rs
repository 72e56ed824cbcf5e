//! TF-IDF vector space fitted over a fixed document set.
//!
//! Weighting: raw term count times smoothed IDF `ln((1 + n) / (1 + df)) + 1`,
//! every vector L2-normalized so cosine similarity is a plain dot product.
//! The vocabulary keeps the `max_features` most frequent terms of the corpus;
//! anything outside it has no dimension and contributes nothing.
use std::collections::{BTreeMap, HashMap};

use crate::analyzer::Analyzer;

/// `(dimension, weight)` pairs sorted by dimension.
pub type SparseVector = Vec<(usize, f32)>;

#[derive(Clone)]
pub struct TfIdfModel {
	analyzer: Analyzer,
	vocabulary: HashMap<String, usize>,
	idf: Vec<f32>,
	doc_vectors: Vec<SparseVector>,
}

impl TfIdfModel {
	pub fn fit(documents: &[String], max_features: usize) -> Self {
		let analyzer = Analyzer::new();
		let tokenized: Vec<Vec<String>> = documents.iter().map(|d| analyzer.terms(d)).collect();

		let mut corpus_freq: BTreeMap<&str, usize> = BTreeMap::new();
		let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
		for terms in &tokenized {
			let mut seen: Vec<&str> = Vec::with_capacity(terms.len());
			for term in terms {
				*corpus_freq.entry(term.as_str()).or_insert(0) += 1;
				if !seen.contains(&term.as_str()) { seen.push(term.as_str()); }
			}
			for term in seen { *doc_freq.entry(term).or_insert(0) += 1; }
		}

		let mut ranked: Vec<(&str, usize)> = corpus_freq.into_iter().collect();
		ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
		ranked.truncate(max_features);
		let mut kept: Vec<&str> = ranked.into_iter().map(|(t, _)| t).collect();
		kept.sort_unstable();

		let n = documents.len() as f64;
		let idf: Vec<f32> = kept
			.iter()
			.map(|t| {
				let df = doc_freq.get(t).copied().unwrap_or(0) as f64;
				(((1.0 + n) / (1.0 + df)).ln() + 1.0) as f32
			})
			.collect();
		let vocabulary: HashMap<String, usize> = kept.iter().enumerate().map(|(dim, t)| ((*t).to_string(), dim)).collect();

		let mut model = Self { analyzer, vocabulary, idf, doc_vectors: Vec::new() };
		model.doc_vectors = tokenized.iter().map(|terms| model.weigh(terms)).collect();
		model
	}

	/// Vector for arbitrary text under the fitted vocabulary and IDF weights.
	pub fn vectorize(&self, text: &str) -> SparseVector {
		self.weigh(&self.analyzer.terms(text))
	}

	fn weigh(&self, terms: &[String]) -> SparseVector {
		let mut counts: BTreeMap<usize, f32> = BTreeMap::new();
		for term in terms {
			if let Some(&dim) = self.vocabulary.get(term) { *counts.entry(dim).or_insert(0.0) += 1.0; }
		}
		let mut vector: SparseVector = counts.into_iter().map(|(dim, tf)| (dim, tf * self.idf[dim])).collect();
		let norm = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
		if norm > 0.0 {
			for (_, w) in &mut vector { *w /= norm; }
		}
		vector
	}

	/// Cosine similarity of `query` against every document, in document order.
	pub fn similarities(&self, query: &str) -> Vec<f32> {
		let q = self.vectorize(query);
		if q.is_empty() { return vec![0.0; self.doc_vectors.len()]; }
		self.doc_vectors.iter().map(|d| sparse_dot(&q, d)).collect()
	}

	pub fn vocabulary_len(&self) -> usize { self.vocabulary.len() }

	pub fn num_docs(&self) -> usize { self.doc_vectors.len() }

	pub fn contains_term(&self, term: &str) -> bool { self.vocabulary.contains_key(term) }
}

/// Dot product of two dimension-sorted sparse vectors.
pub fn sparse_dot(a: &[(usize, f32)], b: &[(usize, f32)]) -> f32 {
	let (mut i, mut j, mut acc) = (0, 0, 0.0f32);
	while i < a.len() && j < b.len() {
		match a[i].0.cmp(&b[j].0) {
			std::cmp::Ordering::Less => i += 1,
			std::cmp::Ordering::Greater => j += 1,
			std::cmp::Ordering::Equal => { acc += a[i].1 * b[j].1; i += 1; j += 1; }
		}
	}
	acc
}
