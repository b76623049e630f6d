//! Domain types shared by the scorer, selector and batcher.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::analysis;

pub type DocId = u64;
pub type BatchId = u64;

/// A forum post as held by the document store.
///
/// - `score`: source-provided quality signal (votes)
/// - `is_accepted`: the post was marked accepted by its author
/// - `sub_documents`: answers, ordered by descending `score` once resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default, rename = "accepted")]
    pub is_accepted: bool,
    #[serde(default, rename = "answers")]
    pub sub_documents: Vec<Document>,
}

impl Document {
    pub fn new(id: DocId, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { id, title: title.into(), body: body.into(), score: 0, is_accepted: false, sub_documents: Vec::new() }
    }

    /// Title and body of every answer, joined in answer order.
    pub fn answer_text(&self) -> String {
        let mut out = String::new();
        for answer in &self.sub_documents {
            for part in [&answer.title, &answer.body] {
                if part.is_empty() { continue; }
                if !out.is_empty() { out.push('\n'); }
                out.push_str(part);
            }
        }
        out
    }

    /// Stable sort of answers by descending quality score.
    pub fn order_answers(&mut self) {
        self.sub_documents.sort_by(|a, b| b.score.cmp(&a.score));
    }
}

/// A node of the syllabus tree. Leaves (no children) are the unit of selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "keywords")]
    pub query_terms: Vec<String>,
    #[serde(default)]
    pub children: Vec<Topic>,
    #[serde(default, alias = "posts")]
    pub documents: Vec<Document>,
}

impl Topic {
    pub fn leaf(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), query_terms: Vec::new(), children: Vec::new(), documents: Vec::new() }
    }

    pub fn with_children(mut self, children: Vec<Topic>) -> Self {
        self.children = children;
        self
    }

    pub fn with_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query_terms = terms.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Analyzed query for this topic: explicit terms when given, the name otherwise.
    pub fn query(&self) -> Query {
        if self.query_terms.is_empty() {
            Query::parse(&self.name)
        } else {
            Query::parse(&self.query_terms.join(" "))
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!("unsupported topic id: {other}"))),
    }
}

/// Bag of analyzed terms. An empty query matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    terms: Vec<String>,
}

impl Query {
    pub fn parse(text: &str) -> Self {
        Self { terms: analysis::tokenize(text) }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Space-joined terms, safe to hand to a query parser.
    pub fn text(&self) -> String {
        self.terms.join(" ")
    }
}

/// Scored fields of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocField {
    Title,
    Body,
    Answers,
}

impl DocField {
    pub const ALL: [DocField; 3] = [DocField::Title, DocField::Body, DocField::Answers];

    pub fn index(self) -> usize {
        match self {
            DocField::Title => 0,
            DocField::Body => 1,
            DocField::Answers => 2,
        }
    }
}

/// Per-field weights for one pipeline pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightScheme {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub title: f32,
    pub body: f32,
    pub answer: f32,
}

impl WeightScheme {
    pub fn new(title: f32, body: f32, answer: f32) -> Self {
        Self { name: None, title, body, answer }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn weight(&self, field: DocField) -> f32 {
        match field {
            DocField::Title => self.title,
            DocField::Body => self.body,
            DocField::Answers => self.answer,
        }
    }

    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("title={},body={},answer={}", self.title, self.body, self.answer),
        }
    }

    pub fn is_valid(&self) -> bool {
        DocField::ALL.iter().all(|f| {
            let w = self.weight(*f);
            w.is_finite() && w >= 0.0
        })
    }
}

impl Default for WeightScheme {
    fn default() -> Self {
        Self::new(0.6, 0.3, 0.1)
    }
}

impl fmt::Display for WeightScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Ranked result with its relevance score; higher is better.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDoc {
    pub id: DocId,
    pub score: f32,
}

/// A fixed-capacity group of documents destined for one crowdsourcing task.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub id: BatchId,
    pub documents: Vec<Document>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn doc_ids(&self) -> Vec<DocId> {
        self.documents.iter().map(|d| d.id).collect()
    }
}
