use anyhow::Result;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::Value;
use tantivy::{DocAddress, Index, IndexReader, Score, Searcher, TantivyDocument};
use tracing::debug;

use syllabus_core::traits::Scorer;
use syllabus_core::types::{DocId, Query, ScoredDoc, WeightScheme};

use crate::tantivy_utils::{register_tokenizer, CorpusFields};

/// BM25 over the title, body and answer fields, each boosted by its scheme weight.
pub struct TantivyScorer {
	index: Index,
	reader: IndexReader,
	fields: CorpusFields,
	weights: WeightScheme,
}

impl TantivyScorer {
	/// Opens an index previously written by `TantivyCorpusIndexer::new`.
	pub fn open(index_dir: &Path) -> Result<Self> {
		let index = Index::open_in_dir(index_dir)?;
		register_tokenizer(&index);
		Self::from_index(index)
	}

	pub(crate) fn from_index(index: Index) -> Result<Self> {
		let fields = CorpusFields::resolve(&index.schema())?;
		let reader = index.reader()?;
		Ok(Self { index, reader, fields, weights: WeightScheme::default() })
	}

	pub fn num_docs(&self) -> u64 {
		self.reader.searcher().num_docs()
	}

	fn query_parser(&self) -> QueryParser {
		let mut qp = QueryParser::for_index(&self.index, vec![self.fields.title, self.fields.body, self.fields.answers]);
		qp.set_field_boost(self.fields.title, self.weights.title);
		qp.set_field_boost(self.fields.body, self.weights.body);
		qp.set_field_boost(self.fields.answers, self.weights.answer);
		qp
	}

	/// Positive-score matches, best first, ties by ascending id.
	pub fn ranked(&self, query: &Query, n: usize) -> Result<Vec<ScoredDoc>> {
		if query.is_empty() || n == 0 { return Ok(Vec::new()); }
		let (parsed, errors) = self.query_parser().parse_query_lenient(&query.text());
		if !errors.is_empty() { debug!("Lenient parse of '{}' dropped {} clause(s)", query.text(), errors.len()); }
		let searcher = self.reader.searcher();
		let total = searcher.num_docs() as usize;
		if total == 0 { return Ok(Vec::new()); }

		// Widen the collection while a score tie straddles position n, so the
		// id tie-break below sees every tied document.
		let mut limit = n.min(total);
		let top = loop {
			let top: Vec<(Score, DocAddress)> = searcher.search(&*parsed, &TopDocs::with_limit(limit))?;
			let boundary_tied = top.len() == limit && limit < total && top.get(n - 1).map(|h| h.0) == top.last().map(|h| h.0);
			if !boundary_tied { break top; }
			limit = (limit * 2).min(total);
		};

		let mut hits = Vec::with_capacity(top.len());
		for (score, addr) in top {
			if score <= 0.0 { continue; }
			hits.push(ScoredDoc { id: self.doc_id(&searcher, addr)?, score });
		}
		hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
		hits.truncate(n);
		Ok(hits)
	}

	fn doc_id(&self, searcher: &Searcher, addr: DocAddress) -> Result<DocId> {
		let doc: TantivyDocument = searcher.doc(addr)?;
		doc.get_first(self.fields.id)
			.and_then(|v| v.as_u64())
			.ok_or_else(|| anyhow::anyhow!("indexed post at {:?} has no id", addr))
	}
}

impl Scorer for TantivyScorer {
	fn set_weights(&mut self, weights: &WeightScheme) {
		self.weights = weights.clone();
	}

	fn top_n(&self, query: &Query, n: usize) -> anyhow::Result<Vec<DocId>> {
		Ok(self.ranked(query, n)?.into_iter().map(|h| h.id).collect())
	}
}
