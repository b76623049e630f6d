use std::collections::BTreeMap;

use crate::types::{BatchId, DocId, Document, Query, WeightScheme};

/// Ranks corpus documents against a topic query under the current weights.
///
/// `set_weights` takes `&mut self`, so it can never overlap a `top_n` call.
pub trait Scorer: Send + Sync {
    fn set_weights(&mut self, weights: &WeightScheme);
    /// At most `n` ids by descending relevance, ties by ascending id.
    /// Only documents with a positive score are returned; an empty query yields `Ok(vec![])`.
    fn top_n(&self, query: &Query, n: usize) -> anyhow::Result<Vec<DocId>>;
}

/// Read-only access to full documents. Unknown ids resolve to `None`.
pub trait DocumentStore: Send + Sync {
    fn fetch_document(&self, id: DocId) -> Option<Document>;
}

pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, payload: &BTreeMap<String, String>) -> String;
}

/// Destination for rendered batch artifacts.
pub trait ArtifactSink {
    fn emit(&mut self, name: &str, content: &str) -> anyhow::Result<()>;
}

/// One unit of work handed to the task vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub batch_id: BatchId,
    pub artifact: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub success: bool,
    pub batch_id: BatchId,
    pub reason: Option<String>,
}

/// Crowdsourcing vendor boundary.
pub trait TaskVendor {
    fn balance(&self) -> anyhow::Result<f64>;
    fn submit_batch(&mut self, items: &[WorkItem]) -> anyhow::Result<Vec<SubmissionRecord>>;
}
