//! syllabus-text
//!
//! Tantivy-backed corpus indexing and multi-field scoring. `TantivyCorpusIndexer`
//! builds the index (in memory or on disk); `TantivyScorer` ranks it with
//! per-field boosts taken from the active weight scheme.

pub mod tantivy_utils;
pub mod index;
pub mod search;

pub use index::TantivyCorpusIndexer;
pub use search::TantivyScorer;
