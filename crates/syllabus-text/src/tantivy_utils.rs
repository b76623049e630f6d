use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, INDEXED, STORED};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

use syllabus_core::analysis::STOP_WORDS;

pub const TOKENIZER: &str = "text_with_stopwords";

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	let _id_field = schema_builder.add_u64_field("id", INDEXED | STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing);
	let _title_field = schema_builder.add_text_field("title", text_options.clone());
	let _body_field = schema_builder.add_text_field("body", text_options.clone());
	let _answers_field = schema_builder.add_text_field("answers", text_options);
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| s.to_string())))
		.build();
	index.tokenizers().register(TOKENIZER, tokenizer);
}

/// Field handles of the corpus schema.
#[derive(Debug, Clone, Copy)]
pub struct CorpusFields {
	pub id: Field,
	pub title: Field,
	pub body: Field,
	pub answers: Field,
}

impl CorpusFields {
	pub fn resolve(schema: &Schema) -> anyhow::Result<Self> {
		Ok(Self {
			id: schema.get_field("id")?,
			title: schema.get_field("title")?,
			body: schema.get_field("body")?,
			answers: schema.get_field("answers")?,
		})
	}
}
