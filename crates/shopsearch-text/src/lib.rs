//! shopsearch-text
//!
//! Lexical retrieval over the catalog: a tantivy analysis pipeline feeding an
//! in-memory TF-IDF vector space ranked by cosine similarity.
pub mod analyzer;
pub mod index;
pub mod tfidf;

pub use analyzer::Analyzer;
pub use index::{SparseIndex, SparseOptions};
pub use tfidf::TfIdfModel;
