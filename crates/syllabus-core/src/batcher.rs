//! Fixed-capacity batch assembly and artifact emission.

use std::collections::BTreeMap;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::state::PipelineState;
use crate::traits::{ArtifactSink, TemplateRenderer};
use crate::types::{Batch, BatchId, Document, WeightScheme};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSettings {
    pub capacity: usize,
    pub start_id: BatchId,
    pub artifact_prefix: String,
    pub artifact_extension: String,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self { capacity: 52, start_id: 0, artifact_prefix: "hit".to_string(), artifact_extension: "html".to_string() }
    }
}

impl BatchSettings {
    pub fn artifact_name(&self, id: BatchId) -> String {
        format!("{}{}.{}", self.artifact_prefix, id, self.artifact_extension)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batcher {
    capacity: usize,
}

impl Batcher {
    /// `capacity` is clamped to at least one document per batch.
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Splits `documents` in order into `ceil(len / capacity)` batches numbered
    /// from `state.next_batch_id()`. The counter itself is not advanced here.
    pub fn assemble(&self, documents: Vec<Document>, state: &PipelineState) -> Vec<Batch> {
        let first_id = state.next_batch_id();
        let mut batches = Vec::with_capacity(documents.len().div_ceil(self.capacity));
        let mut rest = documents.into_iter().peekable();
        while rest.peek().is_some() {
            let chunk: Vec<Document> = rest.by_ref().take(self.capacity).collect();
            batches.push(Batch { id: first_id + batches.len() as BatchId, documents: chunk });
        }
        batches
    }

    /// Assembles, emits every batch, then advances the shared counter by the
    /// number of batches. A failed emit leaves the counter where it was.
    pub fn run(
        &self,
        documents: Vec<Document>,
        state: &mut PipelineState,
        emitter: &BatchEmitter<'_>,
        scheme: &WeightScheme,
        sink: &mut dyn ArtifactSink,
    ) -> anyhow::Result<Vec<Batch>> {
        let batches = self.assemble(documents, state);
        for batch in &batches {
            emitter.emit(batch, scheme, sink)?;
            info!("{} questions added to HIT #{}", batch.len(), batch.id);
        }
        state.advance(batches.len());
        Ok(batches)
    }
}

/// Turns a batch into its rendered artifact.
pub struct BatchEmitter<'a> {
    renderer: &'a dyn TemplateRenderer,
    template: &'a str,
    syllabus_json: &'a str,
    settings: &'a BatchSettings,
}

impl<'a> BatchEmitter<'a> {
    pub fn new(
        renderer: &'a dyn TemplateRenderer,
        template: &'a str,
        syllabus_json: &'a str,
        settings: &'a BatchSettings,
    ) -> Self {
        Self { renderer, template, syllabus_json, settings }
    }

    pub fn payload(&self, batch: &Batch, scheme: &WeightScheme) -> anyhow::Result<BTreeMap<String, String>> {
        let posts = serde_json::to_string(&batch.documents).context("serializing batch documents")?;
        let mut payload = BTreeMap::new();
        payload.insert("syllabus".to_string(), escape_script_json(self.syllabus_json));
        payload.insert("posts".to_string(), escape_script_json(&posts));
        payload.insert("weight_scheme".to_string(), scheme.label());
        payload.insert("batch_id".to_string(), batch.id.to_string());
        Ok(payload)
    }

    pub fn emit(&self, batch: &Batch, scheme: &WeightScheme, sink: &mut dyn ArtifactSink) -> anyhow::Result<()> {
        let html = self.renderer.render(self.template, &self.payload(batch, scheme)?);
        sink.emit(&self.settings.artifact_name(batch.id), &html)
    }
}

/// Rewrites `</` as `<\/` so embedded JSON cannot close its `<script>` block.
fn escape_script_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(ids: &[u64]) -> Vec<Document> {
        ids.iter().map(|&id| Document::new(id, format!("q{id}"), "")).collect()
    }

    #[test]
    fn last_batch_may_be_partial() {
        let batches = Batcher::new(3).assemble(docs(&[1, 2, 4, 5]), &PipelineState::new());
        let shape: Vec<(u64, Vec<u64>)> = batches.iter().map(|b| (b.id, b.doc_ids())).collect();
        assert_eq!(shape, vec![(0, vec![1, 2, 4]), (1, vec![5])]);
    }

    #[test]
    fn exact_multiple_has_no_partial_batch() {
        let batches = Batcher::new(2).assemble(docs(&[1, 2, 3, 4]), &PipelineState::new());
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 2));
    }

    #[test]
    fn empty_input_yields_no_batches() {
        assert!(Batcher::new(5).assemble(Vec::new(), &PipelineState::new()).is_empty());
    }

    #[test]
    fn ids_continue_from_state() {
        let state = PipelineState::starting_at(7);
        let ids: Vec<u64> = Batcher::new(1).assemble(docs(&[1, 2]), &state).iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![7, 8]);
        assert_eq!(state.next_batch_id(), 7, "assemble does not advance the counter");
    }

    #[test]
    fn zero_capacity_is_clamped() {
        assert_eq!(Batcher::new(0).capacity(), 1);
    }

    #[test]
    fn posts_payload_cannot_close_the_script_block() {
        let renderer = crate::render::PlaceholderRenderer;
        let settings = BatchSettings::default();
        let emitter = BatchEmitter::new(&renderer, "", r#"[{"name":"</b>"}]"#, &settings);
        let body = "<p>try</script><script>alert(1)</script></p>";
        let batch = Batch { id: 4, documents: vec![Document::new(1, "xss", body)] };
        let payload = emitter.payload(&batch, &WeightScheme::default()).expect("payload");

        assert!(!payload["posts"].contains("</"));
        assert!(!payload["syllabus"].contains("</"));
        let docs: Vec<Document> = serde_json::from_str(&payload["posts"]).expect("still JSON");
        assert_eq!(docs[0].body, body);
        assert_eq!(payload["batch_id"], "4");
    }

    #[test]
    fn artifact_names_follow_batch_ids() {
        assert_eq!(BatchSettings::default().artifact_name(12), "hit12.html");
    }
}
