//! Runs selection and batching once per weight scheme.
//!
//! Schemes run strictly in sequence and share one `PipelineState`, so a later
//! scheme never re-selects a document an earlier one placed, and batch ids
//! continue where the previous scheme stopped.

use tracing::info;

use crate::batcher::{BatchEmitter, Batcher};
use crate::selector::{SelectionSettings, SelectionWarning, Selector, TopicSelection};
use crate::state::PipelineState;
use crate::traits::{ArtifactSink, DocumentStore, Scorer};
use crate::types::{BatchId, Topic, WeightScheme};

#[derive(Debug, Clone, PartialEq)]
pub struct SchemeReport {
    pub scheme: String,
    pub batch_ids: Vec<BatchId>,
    pub document_count: usize,
    pub topics: Vec<TopicSelection>,
    pub warnings: Vec<SelectionWarning>,
}

impl SchemeReport {
    pub fn batch_count(&self) -> usize {
        self.batch_ids.len()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PipelineReport {
    pub runs: Vec<SchemeReport>,
}

impl PipelineReport {
    pub fn total_batches(&self) -> usize {
        self.runs.iter().map(SchemeReport::batch_count).sum()
    }

    pub fn batch_ids(&self) -> Vec<BatchId> {
        self.runs.iter().flat_map(|r| r.batch_ids.iter().copied()).collect()
    }

    pub fn warning_count(&self) -> usize {
        self.runs.iter().map(|r| r.warnings.len()).sum()
    }
}

pub struct PipelineDriver<'a> {
    scorer: &'a mut dyn Scorer,
    store: &'a dyn DocumentStore,
    emitter: BatchEmitter<'a>,
    selection: SelectionSettings,
    batcher: Batcher,
}

impl<'a> PipelineDriver<'a> {
    pub fn new(
        scorer: &'a mut dyn Scorer,
        store: &'a dyn DocumentStore,
        emitter: BatchEmitter<'a>,
        selection: SelectionSettings,
        batcher: Batcher,
    ) -> Self {
        Self { scorer, store, emitter, selection, batcher }
    }

    pub fn run(
        &mut self,
        leaves: &[&Topic],
        schemes: &[WeightScheme],
        state: &mut PipelineState,
        sink: &mut dyn ArtifactSink,
    ) -> anyhow::Result<PipelineReport> {
        let mut report = PipelineReport::default();
        for (scheme_index, scheme) in schemes.iter().enumerate() {
            info!("Weight scheme {}/{}: {}", scheme_index + 1, schemes.len(), scheme);
            let run = self.run_scheme(leaves, scheme, state, sink)?;
            info!("Scheme '{}' produced {} batch(es) from {} document(s)", run.scheme, run.batch_count(), run.document_count);
            report.runs.push(run);
        }
        info!("Pipeline finished: {} batch(es) across {} scheme(s)", report.total_batches(), report.runs.len());
        Ok(report)
    }

    fn run_scheme(
        &mut self,
        leaves: &[&Topic],
        scheme: &WeightScheme,
        state: &mut PipelineState,
        sink: &mut dyn ArtifactSink,
    ) -> anyhow::Result<SchemeReport> {
        self.scorer.set_weights(scheme);
        let selection = Selector::new(&*self.scorer, self.store, self.selection).select(leaves, state);
        let document_count = selection.documents.len();
        let batches = self.batcher.run(selection.documents, state, &self.emitter, scheme, sink)?;
        Ok(SchemeReport {
            scheme: scheme.label(),
            batch_ids: batches.iter().map(|b| b.id).collect(),
            document_count,
            topics: selection.topics,
            warnings: selection.warnings,
        })
    }
}
