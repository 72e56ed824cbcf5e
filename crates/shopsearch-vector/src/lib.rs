//! Dense retrieval over sentence embeddings of the catalog.
//!
//! The index is a flat in-memory matrix of unit vectors; at catalog scale an
//! exhaustive dot-product scan is exact and cheap, so no ANN structure is kept.
pub mod index_build;
pub mod search;

pub use index_build::{DenseBuildOptions, DenseIndex};
