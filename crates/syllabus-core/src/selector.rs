//! Per-topic candidate selection with global deduplication.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::state::PipelineState;
use crate::traits::{DocumentStore, Scorer};
use crate::types::{DocId, Document, Topic};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSettings {
    /// Documents accepted per leaf topic (K).
    pub per_topic: usize,
    /// Extra candidates requested beyond K to absorb duplicates and missing documents.
    pub over_fetch: usize,
}

impl SelectionSettings {
    pub fn request_size(&self) -> usize {
        self.per_topic.saturating_add(self.over_fetch)
    }
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self { per_topic: 5, over_fetch: 40 }
    }
}

/// Recoverable conditions met while selecting; they never stop a run.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionWarning {
    EmptyQuery { topic: String },
    MissingDocument { topic: String, id: DocId },
    UnderFilled { topic: String, accepted: usize, target: usize },
    ScorerFailed { topic: String, reason: String },
}

impl fmt::Display for SelectionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyQuery { topic } => write!(f, "topic '{topic}' has an empty query"),
            Self::MissingDocument { topic, id } => write!(f, "topic '{topic}': document {id} not found in store"),
            Self::UnderFilled { topic, accepted, target } => {
                write!(f, "topic '{topic}' accepted {accepted} of {target} documents")
            }
            Self::ScorerFailed { topic, reason } => write!(f, "topic '{topic}': scorer failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicSelection {
    pub topic: String,
    pub accepted: Vec<DocId>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SelectionOutcome {
    /// Accepted documents, topic order then rank order.
    pub documents: Vec<Document>,
    pub topics: Vec<TopicSelection>,
    pub warnings: Vec<SelectionWarning>,
}

pub struct Selector<'a> {
    scorer: &'a dyn Scorer,
    store: &'a dyn DocumentStore,
    settings: SelectionSettings,
}

impl<'a> Selector<'a> {
    pub fn new(scorer: &'a dyn Scorer, store: &'a dyn DocumentStore, settings: SelectionSettings) -> Self {
        Self { scorer, store, settings }
    }

    pub fn select(&self, leaves: &[&Topic], state: &mut PipelineState) -> SelectionOutcome {
        let mut outcome = SelectionOutcome::default();
        for topic in leaves {
            let accepted = self.select_topic(topic, state, &mut outcome);
            outcome.topics.push(TopicSelection { topic: topic_label(topic), accepted });
        }
        for w in &outcome.warnings { warn!("{}", w); }
        outcome
    }

    fn select_topic(&self, topic: &Topic, state: &mut PipelineState, outcome: &mut SelectionOutcome) -> Vec<DocId> {
        let label = topic_label(topic);
        let target = self.settings.per_topic;
        let query = topic.query();
        if query.is_empty() {
            outcome.warnings.push(SelectionWarning::EmptyQuery { topic: label });
            return Vec::new();
        }
        let candidates = match self.scorer.top_n(&query, self.settings.request_size()) {
            Ok(ids) => ids,
            Err(e) => {
                outcome.warnings.push(SelectionWarning::ScorerFailed { topic: label, reason: e.to_string() });
                return Vec::new();
            }
        };
        let mut accepted = Vec::with_capacity(target);
        for id in candidates {
            if accepted.len() == target { break; }
            if state.is_used(id) { continue; }
            let Some(doc) = self.store.fetch_document(id) else {
                outcome.warnings.push(SelectionWarning::MissingDocument { topic: label.clone(), id });
                continue;
            };
            if state.claim(id) {
                accepted.push(id);
                outcome.documents.push(doc);
            }
        }
        debug!("Topic '{}' accepted {} document(s)", label, accepted.len());
        if accepted.len() < target {
            outcome.warnings.push(SelectionWarning::UnderFilled { topic: label, accepted: accepted.len(), target });
        }
        accepted
    }
}

fn topic_label(topic: &Topic) -> String {
    if topic.name.is_empty() { topic.id.clone() } else { topic.name.clone() }
}
