//! syllabus-core
//!
//! Relevance ranking and batch assembly for syllabus-driven crowdsourcing
//! tasks: topic tree traversal, multi-field BM25 scoring, per-topic selection
//! with global deduplication, fixed-size batching and the driver that runs
//! them once per weight scheme.

#![deny(dead_code)]
#![deny(unused_variables)]

pub mod analysis;
pub mod batcher;
pub mod bm25f;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod selector;
pub mod state;
pub mod store;
pub mod topic_tree;
pub mod traits;
pub mod types;
pub mod vendor;

pub use error::{Error, Result};
pub use pipeline::{PipelineDriver, PipelineReport};
pub use state::PipelineState;
pub use types::{Batch, DocId, Document, Query, Topic, WeightScheme};
