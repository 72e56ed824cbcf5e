use crate::types::{RankedHit, SourceKind};

/// Sentence-embedding backend. Implementations return one L2-normalized
/// vector of length `dim()` per input text.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the backend/model (e.g. `minilm:all-MiniLM-L6-v2:d384`).
    fn id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// A built index that answers ranked nearest-neighbour queries.
pub trait Retriever: Send + Sync {
    fn kind(&self) -> SourceKind;
    /// False for the degraded no-op index.
    fn is_available(&self) -> bool;
    fn retrieve(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<RankedHit>>;
}
