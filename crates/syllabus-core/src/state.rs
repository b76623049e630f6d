use std::collections::HashSet;

use crate::types::{BatchId, DocId};

/// Mutable state shared by every weight-scheme run of one invocation.
///
/// - `used_ids`: documents already placed in a batch; never selected again
/// - `next_batch_id`: id the next emitted batch receives
#[derive(Debug, Default, Clone)]
pub struct PipelineState {
    used_ids: HashSet<DocId>,
    next_batch_id: BatchId,
}

impl PipelineState {
    pub fn new() -> Self { Self::default() }

    pub fn starting_at(next_batch_id: BatchId) -> Self {
        Self { used_ids: HashSet::new(), next_batch_id }
    }

    pub fn is_used(&self, id: DocId) -> bool {
        self.used_ids.contains(&id)
    }

    /// Claims `id`. Returns `false` when it was already claimed.
    pub fn claim(&mut self, id: DocId) -> bool {
        self.used_ids.insert(id)
    }

    pub fn used_count(&self) -> usize {
        self.used_ids.len()
    }

    pub fn next_batch_id(&self) -> BatchId {
        self.next_batch_id
    }

    pub(crate) fn advance(&mut self, batch_count: usize) {
        self.next_batch_id += batch_count as BatchId;
    }
}
