use serde::Serialize;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use shopsearch_core::config::{Settings, DEFAULT_MAX_ROWS, DEFAULT_ROWS, DEFAULT_RRF_ALPHA};
use shopsearch_core::error::{Error, Result};
use shopsearch_core::traits::{Embedder, Retriever};
use shopsearch_core::types::{RankedHit, SourceKind};
use shopsearch_core::Catalog;
use shopsearch_embed::{load_embedder, EmbedderOptions};
use shopsearch_text::{SparseIndex, SparseOptions};
use shopsearch_vector::{DenseBuildOptions, DenseIndex};

use crate::fusion::{reciprocal_rank_fusion, FusionParams};

/// Produces the dense embedder on first use. Called at most once per service.
pub type EmbedderFactory = Box<dyn Fn() -> anyhow::Result<Arc<dyn Embedder>> + Send + Sync>;

/// Factory for the configured backend (candle model or hashing stand-in).
pub fn configured_embedder(options: EmbedderOptions) -> EmbedderFactory {
    Box::new(move || load_embedder(&options))
}

/// How out-of-range `rows` / `alpha` values are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamPolicy {
    /// Adjust into range and explain the adjustment in `notes`.
    #[default]
    Clamp,
    /// Reject with `Error::InvalidParameter`.
    Strict,
}

#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub sparse: SparseOptions,
    pub dense_enabled: bool,
    pub dense: DenseBuildOptions,
    pub default_rows: usize,
    pub max_rows: usize,
    pub default_alpha: f32,
    pub policy: ParamPolicy,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            sparse: SparseOptions::default(),
            dense_enabled: true,
            dense: DenseBuildOptions::default(),
            default_rows: DEFAULT_ROWS,
            max_rows: DEFAULT_MAX_ROWS,
            default_alpha: DEFAULT_RRF_ALPHA,
            policy: ParamPolicy::Clamp,
        }
    }
}

impl ServiceOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            sparse: SparseOptions::from(&settings.sparse),
            dense_enabled: settings.dense.enabled,
            dense: DenseBuildOptions::from(&settings.dense),
            default_rows: settings.search.default_rows,
            max_rows: settings.search.max_rows,
            default_alpha: settings.search.default_alpha,
            policy: if settings.search.strict_params { ParamPolicy::Strict } else { ParamPolicy::Clamp },
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    /// Requested result count; `None` means the configured default.
    pub rows: Option<i64>,
    pub use_sparse: bool,
    pub use_dense: bool,
    /// Fuse with RRF when both paths return hits.
    pub use_rerank: bool,
    pub alpha: Option<f32>,
    /// Opaque; echoed back, never interpreted.
    pub dataset_id: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), rows: None, use_sparse: true, use_dense: true, use_rerank: true, alpha: None, dataset_id: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Fused,
    SparseOnly,
    DenseOnly,
    Empty,
}

#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub query: String,
    pub count: usize,
    pub mode: SearchMode,
    pub results: Vec<RankedHit>,
    /// Parameter adjustments and unavailable paths, in the order they occurred.
    pub notes: Vec<String>,
    pub dataset_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub sparse_available: bool,
    pub dense_available: bool,
}

/// Build summary for diagnostics (`inspect`, `/health`).
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub catalog_items: usize,
    pub vocabulary: usize,
    pub embedder: Option<String>,
    pub dense_dim: Option<usize>,
    pub capabilities: Capabilities,
}

struct Indexes {
    sparse: SparseIndex,
    dense: Option<DenseIndex>,
    dense_reason: String,
}

impl Indexes {
    fn sparse(&self) -> Result<&SparseIndex> {
        if self.sparse.is_available() {
            Ok(&self.sparse)
        } else {
            Err(Error::IndexUnavailable { path: SourceKind::Sparse, reason: "disabled by configuration".into() })
        }
    }

    fn dense(&self) -> Result<&DenseIndex> {
        self.dense.as_ref().ok_or_else(|| Error::IndexUnavailable { path: SourceKind::Dense, reason: self.dense_reason.clone() })
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities { sparse_available: self.sparse.is_available(), dense_available: self.dense.is_some() }
    }
}

/// Answers catalog searches over lazily built sparse and dense indexes.
///
/// Indexes are built exactly once, on `warm_up()` or the first search,
/// even under concurrent first requests; afterwards all state is read-only.
pub struct SearchService {
    catalog: Arc<Catalog>,
    options: ServiceOptions,
    embedder_factory: EmbedderFactory,
    indexes: OnceLock<Indexes>,
}

impl SearchService {
    pub fn new(catalog: Arc<Catalog>, options: ServiceOptions, embedder_factory: EmbedderFactory) -> Self {
        Self { catalog, options, embedder_factory, indexes: OnceLock::new() }
    }

    pub fn catalog(&self) -> &Catalog { &self.catalog }

    pub fn options(&self) -> &ServiceOptions { &self.options }

    pub fn is_warm(&self) -> bool { self.indexes.get().is_some() }

    /// Build both indexes now instead of on the first search.
    pub fn warm_up(&self) -> Capabilities { self.indexes().capabilities() }

    pub fn capabilities(&self) -> Capabilities { self.indexes().capabilities() }

    pub fn stats(&self) -> IndexStats {
        let indexes = self.indexes();
        IndexStats {
            catalog_items: self.catalog.len(),
            vocabulary: indexes.sparse.vocabulary_len(),
            embedder: indexes.dense.as_ref().map(|d| d.embedder_id().to_string()),
            dense_dim: indexes.dense.as_ref().map(DenseIndex::dim),
            capabilities: indexes.capabilities(),
        }
    }

    fn indexes(&self) -> &Indexes { self.indexes.get_or_init(|| self.build_indexes()) }

    fn build_indexes(&self) -> Indexes {
        let start = Instant::now();
        let sparse = SparseIndex::build(&self.catalog, &self.options.sparse);
        let (dense, dense_reason) = if self.options.dense_enabled {
            match (self.embedder_factory)() {
                Ok(embedder) => match DenseIndex::build(embedder, &self.catalog, &self.options.dense) {
                    Ok(index) => (Some(index), String::new()),
                    Err(e) => {
                        tracing::warn!(error = %e, "dense index build failed");
                        (None, format!("index build failed: {e}"))
                    }
                },
                Err(e) => {
                    tracing::warn!(error = %e, "embedder unavailable");
                    (None, format!("embedder unavailable: {e}"))
                }
            }
        } else {
            (None, "disabled by configuration".to_string())
        };
        let indexes = Indexes { sparse, dense, dense_reason };
        let caps = indexes.capabilities();
        tracing::info!(
            items = self.catalog.len(),
            sparse = caps.sparse_available,
            dense = caps.dense_available,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search indexes ready"
        );
        indexes
    }

    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let text = request.query.trim();
        if text.is_empty() {
            return Err(Error::InvalidQuery("query must not be empty".into()));
        }
        let start = Instant::now();
        let mut notes = Vec::new();
        let rows = self.resolve_rows(request.rows, &mut notes)?;
        let alpha = self.resolve_alpha(request.alpha, &mut notes)?;
        let indexes = self.indexes();

        let mut unavailable = 0;
        let sparse_hits = if request.use_sparse {
            match indexes.sparse() {
                Ok(index) => retrieve(index, text, rows, &mut notes),
                Err(e) => {
                    unavailable += 1;
                    notes.push(e.to_string());
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        let dense_hits = if request.use_dense {
            match indexes.dense() {
                Ok(index) => retrieve(index, text, rows, &mut notes),
                Err(e) => {
                    unavailable += 1;
                    notes.push(e.to_string());
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        let requested = usize::from(request.use_sparse) + usize::from(request.use_dense);
        if requested == 0 {
            notes.push("no retrieval path requested".to_string());
        } else if unavailable == requested {
            notes.push("no requested retrieval path is available".to_string());
        }

        let (mode, results) = if request.use_rerank && !sparse_hits.is_empty() && !dense_hits.is_empty() {
            (SearchMode::Fused, reciprocal_rank_fusion(&sparse_hits, &dense_hits, alpha, rows))
        } else if !dense_hits.is_empty() {
            (SearchMode::DenseOnly, dense_hits)
        } else if !sparse_hits.is_empty() {
            (SearchMode::SparseOnly, sparse_hits)
        } else {
            (SearchMode::Empty, Vec::new())
        };

        tracing::info!(
            query = text,
            rows,
            mode = ?mode,
            count = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search"
        );
        Ok(SearchResponse {
            query: request.query.clone(),
            count: results.len(),
            mode,
            results,
            notes,
            dataset_id: request.dataset_id.clone(),
        })
    }

    fn resolve_rows(&self, rows: Option<i64>, notes: &mut Vec<String>) -> Result<usize> {
        let max = self.options.max_rows.max(1);
        let Some(requested) = rows else { return Ok(self.options.default_rows.clamp(1, max)) };
        let clamped = usize::try_from(requested.max(1)).unwrap_or(max).min(max);
        if i64::try_from(clamped).ok() == Some(requested) {
            return Ok(clamped);
        }
        match self.options.policy {
            ParamPolicy::Strict => Err(Error::InvalidParameter { name: "rows", reason: format!("{requested} is outside 1..={max}") }),
            ParamPolicy::Clamp => {
                notes.push(format!("rows {requested} is outside 1..={max}; using {clamped}"));
                Ok(clamped)
            }
        }
    }

    fn resolve_alpha(&self, alpha: Option<f32>, notes: &mut Vec<String>) -> Result<f32> {
        let default = FusionParams::sanitize(self.options.default_alpha).alpha;
        let Some(requested) = alpha else { return Ok(default) };
        if requested.is_finite() && requested > 0.0 {
            return Ok(requested);
        }
        match self.options.policy {
            ParamPolicy::Strict => Err(Error::InvalidParameter { name: "alpha", reason: format!("{requested} is not a positive number") }),
            ParamPolicy::Clamp => {
                notes.push(format!("alpha {requested} is not a positive number; using {default}"));
                Ok(default)
            }
        }
    }
}

/// Run one retrieval path. A failing query is not fatal: it is logged, noted
/// and treated as an empty list.
fn retrieve(retriever: &dyn Retriever, text: &str, rows: usize, notes: &mut Vec<String>) -> Vec<RankedHit> {
    retriever.retrieve(text, rows).unwrap_or_else(|e| {
        tracing::warn!(path = %retriever.kind(), error = %e, "retrieval failed");
        notes.push(format!("{} retrieval failed: {e}", retriever.kind()));
        Vec::new()
    })
}
