use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use shopsearch_core::config::DEFAULT_RRF_ALPHA;
use shopsearch_core::types::{CatalogItem, RankedHit, SourceKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionParams {
    /// Rank offset: a hit at zero-based position `r` contributes `1 / (alpha + r + 1)`.
    pub alpha: f32,
}

impl Default for FusionParams {
    fn default() -> Self { Self { alpha: DEFAULT_RRF_ALPHA } }
}

impl FusionParams {
    /// Replace a non-finite or non-positive alpha with the default.
    pub fn sanitize(alpha: f32) -> Self {
        if alpha.is_finite() && alpha > 0.0 { Self { alpha } } else { Self::default() }
    }
}

struct Fused {
    item: Arc<CatalogItem>,
    score: f64,
    in_both: bool,
}

/// Reciprocal Rank Fusion of a sparse and a dense ranked list.
///
/// Each id's score is the sum of `1 / (alpha + rank0 + 1)` over the lists it
/// appears in. Ordering is score descending, then ids present in both lists,
/// then id ascending, so equal inputs always produce the same output.
pub fn reciprocal_rank_fusion(sparse: &[RankedHit], dense: &[RankedHit], alpha: f32, top_k: usize) -> Vec<RankedHit> {
    if top_k == 0 || (sparse.is_empty() && dense.is_empty()) { return Vec::new(); }
    let alpha = f64::from(FusionParams::sanitize(alpha).alpha);

    let sparse_pos = positions(sparse);
    let dense_pos = positions(dense);

    let mut fused: HashMap<&str, Fused> = HashMap::with_capacity(sparse_pos.len() + dense_pos.len());
    for hit in sparse.iter().chain(dense) {
        let id = hit.id();
        if fused.contains_key(id) { continue; }
        let s = sparse_pos.get(id).copied();
        let d = dense_pos.get(id).copied();
        let score = s.map_or(0.0, |r| contribution(alpha, r)) + d.map_or(0.0, |r| contribution(alpha, r));
        fused.insert(id, Fused { item: hit.item.clone(), score, in_both: s.is_some() && d.is_some() });
    }

    let mut ordered: Vec<Fused> = fused.into_values().collect();
    ordered.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.in_both.cmp(&a.in_both))
            .then_with(|| a.item.id.cmp(&b.item.id))
    });
    ordered
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(i, f)| RankedHit { rank: i + 1, score: f.score as f32, item: f.item, source: SourceKind::Fused })
        .collect()
}

/// Zero-based position of each id; a repeated id keeps its first position.
fn positions(list: &[RankedHit]) -> HashMap<&str, usize> {
    let mut map = HashMap::with_capacity(list.len());
    for (i, hit) in list.iter().enumerate() {
        map.entry(hit.id()).or_insert(i);
    }
    map
}

fn contribution(alpha: f64, rank0: usize) -> f64 { 1.0 / (alpha + rank0 as f64 + 1.0) }
