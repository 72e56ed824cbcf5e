//! Hybrid retrieval: Reciprocal Rank Fusion of the sparse and dense paths,
//! and the query service that decides which paths run and how to combine them.
pub mod fusion;
pub mod service;

pub use fusion::{reciprocal_rank_fusion, FusionParams};
pub use service::{
    configured_embedder, Capabilities, EmbedderFactory, IndexStats, ParamPolicy, SearchMode, SearchRequest, SearchResponse, SearchService,
    ServiceOptions,
};
