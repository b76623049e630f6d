use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tantivy::{doc, Index, IndexWriter};
use tracing::info;

use syllabus_core::analysis::strip_markup;
use syllabus_core::types::Document;

use crate::search::TantivyScorer;
use crate::tantivy_utils::{build_schema, register_tokenizer, CorpusFields};

pub struct TantivyCorpusIndexer {
	index: Index,
	fields: CorpusFields,
	show_progress: bool,
}

impl TantivyCorpusIndexer {
	/// Creates a fresh index in `index_dir`, replacing whatever was there.
	pub fn new(index_dir: &Path) -> Result<Self> {
		let schema = build_schema();
		if index_dir.exists() { std::fs::remove_dir_all(index_dir)?; }
		std::fs::create_dir_all(index_dir)?;
		let index = Index::create_in_dir(index_dir, schema.clone())?;
		Self::with_index(index, &schema)
	}

	pub fn in_memory() -> Result<Self> {
		let schema = build_schema();
		let index = Index::create_in_ram(schema.clone());
		Self::with_index(index, &schema)
	}

	fn with_index(index: Index, schema: &tantivy::schema::Schema) -> Result<Self> {
		register_tokenizer(&index);
		let fields = CorpusFields::resolve(schema)?;
		Ok(Self { index, fields, show_progress: false })
	}

	pub fn with_progress(mut self, show: bool) -> Self {
		self.show_progress = show;
		self
	}

	/// Indexes title, body and accumulated answer text of every document and commits.
	pub fn index_documents<'a, I>(&self, documents: I) -> Result<usize>
	where
		I: IntoIterator<Item = &'a Document>,
	{
		let documents: Vec<&Document> = documents.into_iter().collect();
		let pb = if self.show_progress { ProgressBar::new(documents.len() as u64) } else { ProgressBar::hidden() };
		pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} posts ({percent}%)")?.progress_chars("#>-"));
		let mut index_writer: IndexWriter = self.index.writer(50_000_000)?;
		for d in &documents {
			index_writer.add_document(doc!(
				self.fields.id => d.id,
				self.fields.title => strip_markup(&d.title),
				self.fields.body => strip_markup(&d.body),
				self.fields.answers => strip_markup(&d.answer_text()),
			))?;
			pb.inc(1);
		}
		index_writer.commit()?;
		pb.finish_and_clear();
		info!("Indexed {} posts into tantivy", documents.len());
		Ok(documents.len())
	}

	pub fn into_scorer(self) -> Result<TantivyScorer> {
		TantivyScorer::from_index(self.index)
	}
}
