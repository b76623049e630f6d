//! JSON-backed document store.
//!
//! The corpus is a JSON array of questions, each with nested `answers`. A
//! directory is read as the concatenation of every `*.json` file beneath it,
//! in path order.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::traits::DocumentStore;
use crate::types::{DocId, Document};

#[derive(Debug, Default, Clone)]
pub struct CorpusStore {
    by_id: HashMap<DocId, Document>,
    order: Vec<DocId>,
}

impl CorpusStore {
    pub fn new() -> Self { Self::default() }

    pub fn from_documents<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        let mut store = Self::new();
        for doc in documents { store.insert(doc); }
        store
    }

    /// Loads a corpus file, or every `*.json` file under a directory.
    pub fn load(path: &Path) -> Result<Self> {
        let files = if path.is_dir() { list_json_files(path) } else { vec![path.to_path_buf()] };
        if files.is_empty() {
            warn!("No .json corpus files found under {}", path.display());
        }
        let mut store = Self::new();
        for file in &files {
            let raw = fs::read_to_string(file).map_err(|e| Error::io(file, e))?;
            let docs: Vec<Document> = serde_json::from_str(&raw)
                .map_err(|e| Error::json(file.display().to_string(), e))?;
            debug!("Loaded {} documents from {}", docs.len(), file.display());
            for doc in docs { store.insert(doc); }
        }
        info!("Corpus ready: {} documents from {} file(s)", store.len(), files.len());
        Ok(store)
    }

    /// Inserts or replaces a document, ordering its answers by descending score.
    /// A replaced document keeps its original position.
    pub fn insert(&mut self, mut doc: Document) {
        doc.order_answers();
        let id = doc.id;
        if self.by_id.insert(id, doc).is_none() {
            self.order.push(id);
        }
    }

    pub fn len(&self) -> usize { self.order.len() }

    pub fn is_empty(&self) -> bool { self.order.is_empty() }

    /// Documents in insertion order, the order the scorers index them.
    pub fn documents(&self) -> impl Iterator<Item = &Document> + '_ {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }
}

impl DocumentStore for CorpusStore {
    fn fetch_document(&self, id: DocId) -> Option<Document> {
        self.by_id.get(&id).cloned()
    }
}

fn list_json_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("json") { files.push(path.to_path_buf()); }
    }
    files.sort();
    files
}
