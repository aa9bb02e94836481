use tantivy::schema::{
	Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, INDEXED, STORED, STRING,
};
use tantivy::tokenizer::{LowerCaser, RawTokenizer, RemoveLongFilter, SimpleTokenizer, TextAnalyzer};
use tantivy::Index;

use catalog_core::Error;

pub const TEXT_TOKENIZER: &str = "catalog_text";
pub const PREFIX_TOKENIZER: &str = "catalog_prefix";

/// Resolved handles for every product field in the schema.
#[derive(Debug, Clone, Copy)]
pub struct ProductFields {
	pub id: Field,
	pub name: Field,
	/// Whole lowercased name as a single term, for prefix suggestions.
	pub name_prefix: Field,
	pub description: Field,
	pub manufacturer: Field,
	pub category: Field,
	pub price: Field,
}

impl ProductFields {
	pub fn from_schema(schema: &Schema) -> Result<Self, Error> {
		let get = |name: &str| schema.get_field(name).map_err(|e| Error::operation("schema", e));
		Ok(Self {
			id: get("id")?,
			name: get("name")?,
			name_prefix: get("name_prefix")?,
			description: get("description")?,
			manufacturer: get("manufacturer")?,
			category: get("category")?,
			price: get("price")?,
		})
	}
}

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	let text_indexing = TextFieldIndexing::default().set_tokenizer(TEXT_TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(text_indexing).set_stored();
	let prefix_indexing = TextFieldIndexing::default().set_tokenizer(PREFIX_TOKENIZER).set_index_option(IndexRecordOption::Basic);
	let prefix_options = TextOptions::default().set_indexing_options(prefix_indexing);
	schema_builder.add_text_field("id", STRING | STORED);
	schema_builder.add_text_field("name", text_options.clone());
	schema_builder.add_text_field("name_prefix", prefix_options);
	schema_builder.add_text_field("description", text_options);
	schema_builder.add_text_field("manufacturer", STRING | STORED);
	schema_builder.add_text_field("category", STRING | STORED);
	schema_builder.add_f64_field("price", INDEXED | STORED | FAST);
	schema_builder.build()
}

/// Must run on every `Index` handle, freshly created or reopened.
pub fn register_tokenizers(index: &Index) {
	let text = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(RemoveLongFilter::limit(40))
		.filter(LowerCaser)
		.build();
	let prefix = TextAnalyzer::builder(RawTokenizer::default())
		.filter(LowerCaser)
		.build();
	index.tokenizers().register(TEXT_TOKENIZER, text);
	index.tokenizers().register(PREFIX_TOKENIZER, prefix);
}
