//! Domain types shared by the sparse, dense and fusion layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub type ItemId = String;

/// A catalog record as served to clients.
///
/// - `id`: unique within one catalog
/// - `title`/`description`: the text that both indexes are built from
/// - `price`: list price in the catalog's currency
/// - `image_url`: reference to the product image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_url: String,
}

impl CatalogItem {
    /// The text document indexed for this item.
    pub fn document(&self) -> String {
        format!("{}\n{}", self.title, self.description)
    }
}

/// Indicates which retrieval path produced a ranked list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Sparse,
    Dense,
    Fused,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Sparse => "sparse",
            SourceKind::Dense => "dense",
            SourceKind::Fused => "fused",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a ranked list.
///
/// `rank` is 1-based and strictly increasing within a list. `score` is
/// path-specific (TF-IDF cosine, embedding cosine or RRF sum) but higher is
/// always better. Hits produced by the fusion engine carry `SourceKind::Fused`.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedHit {
    pub rank: usize,
    pub score: f32,
    pub item: Arc<CatalogItem>,
    pub source: SourceKind,
}

impl RankedHit {
    pub fn id(&self) -> &str {
        &self.item.id
    }
}

/// Turn `(position, score)` pairs into a ranked list.
///
/// Sorts by descending score with ties broken by ascending position, keeps at
/// most `top_k` entries and assigns 1-based ranks. `item_at` maps a catalog
/// position back to its item.
pub fn rank_positions<F>(
    mut scored: Vec<(usize, f32)>,
    top_k: usize,
    source: SourceKind,
    item_at: F,
) -> Vec<RankedHit>
where
    F: Fn(usize) -> Option<Arc<CatalogItem>>,
{
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    scored
        .into_iter()
        .filter_map(|(pos, score)| item_at(pos).map(|item| (score, item)))
        .take(top_k)
        .enumerate()
        .map(|(i, (score, item))| RankedHit { rank: i + 1, score, item, source })
        .collect()
}
