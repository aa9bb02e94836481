use std::ops::Bound;

use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, EmptyQuery, FuzzyTermQuery, Occur, Query, RangeQuery, RegexQuery, TermQuery};
use tantivy::schema::{Field as SchemaField, IndexRecordOption, Value};
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, TantivyDocument, Term};

use catalog_core::query::{Field, Fuzziness, QueryClause, SearchRequest};
use catalog_core::{Error, Hit, Product, Result};

use crate::index::IndexHandle;
use crate::schema::{ProductFields, TEXT_TOKENIZER};

/// Exact term matches outrank fuzzy ones for the same term.
const EXACT_BOOST: f32 = 2.0;

fn schema_field(fields: &ProductFields, field: Field) -> SchemaField {
	match field {
		Field::Name => fields.name,
		Field::Description => fields.description,
		Field::Manufacturer => fields.manufacturer,
		Field::Category => fields.category,
		Field::Price => fields.price,
	}
}

/// Runs the analyzer used at index time so query terms line up with
/// indexed terms.
fn analyze(index: &Index, text: &str) -> Result<Vec<String>> {
	let mut analyzer = index
		.tokenizers()
		.get(TEXT_TOKENIZER)
		.ok_or_else(|| Error::Operation(format!("tokenizer '{TEXT_TOKENIZER}' not registered")))?;
	let mut stream = analyzer.token_stream(text);
	let mut terms = Vec::new();
	while stream.advance() {
		terms.push(stream.token().text.clone());
	}
	Ok(terms)
}

/// One should-clause per (term, field): exact match plus, when the term is
/// long enough, a fuzzy match with transpositions counted as one edit.
fn multi_match(handle: &IndexHandle, text: &str, targets: &[Field], fuzziness: Fuzziness) -> Result<Box<dyn Query>> {
	let terms = analyze(&handle.index, text)?;
	let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
	for term_text in &terms {
		let distance = fuzziness.max_edits(term_text);
		for target in targets {
			let term = Term::from_field_text(schema_field(&handle.fields, *target), term_text);
			let exact = TermQuery::new(term.clone(), IndexRecordOption::WithFreqs);
			clauses.push((Occur::Should, Box::new(BoostQuery::new(Box::new(exact), EXACT_BOOST))));
			if distance > 0 {
				clauses.push((Occur::Should, Box::new(FuzzyTermQuery::new(term, distance, true))));
			}
		}
	}
	if clauses.is_empty() {
		return Ok(Box::new(EmptyQuery));
	}
	Ok(Box::new(BooleanQuery::new(clauses)))
}

/// Regex over the whole lowercased name. `literal` is escaped and wrapped in
/// `lead` and `trail`.
fn name_pattern(handle: &IndexHandle, lead: &str, literal: &str, trail: &str) -> Result<Box<dyn Query>> {
	let pattern = format!("{lead}{}{trail}", regex::escape(&literal.to_lowercase()));
	let query = RegexQuery::from_pattern(&pattern, handle.fields.name_prefix)
		.map_err(|e| Error::operation("name pattern query", e))?;
	Ok(Box::new(query))
}

fn terms(handle: &IndexHandle, pairs: &[(Field, String)]) -> Box<dyn Query> {
	let clauses: Vec<(Occur, Box<dyn Query>)> = pairs
		.iter()
		.map(|(field, value)| {
			let term = Term::from_field_text(schema_field(&handle.fields, *field), value);
			(Occur::Must, Box::new(TermQuery::new(term, IndexRecordOption::Basic)) as Box<dyn Query>)
		})
		.collect();
	if clauses.is_empty() {
		return Box::new(EmptyQuery);
	}
	Box::new(BooleanQuery::new(clauses))
}

fn range(handle: &IndexHandle, field: Field, lower: Bound<f64>, upper: Bound<f64>) -> Box<dyn Query> {
	let field = schema_field(&handle.fields, field);
	let to_term = |bound: Bound<f64>| bound.map(|v| Term::from_field_f64(field, v));
	Box::new(RangeQuery::new(to_term(lower), to_term(upper)))
}

fn compile(handle: &IndexHandle, clause: &QueryClause) -> Result<Box<dyn Query>> {
	match clause {
		QueryClause::MatchNone => Ok(Box::new(EmptyQuery)),
		QueryClause::MultiMatch { text, fields, fuzziness } => multi_match(handle, text, fields, *fuzziness),
		QueryClause::Prefix { prefix, .. } => name_pattern(handle, "", prefix, ".*"),
		QueryClause::Contains { text, .. } => name_pattern(handle, ".*", text, ".*"),
		QueryClause::Terms(pairs) => Ok(terms(handle, pairs)),
		QueryClause::Range { field, lower, upper } => Ok(range(handle, *field, *lower, *upper)),
	}
}

fn to_product(fields: &ProductFields, doc: &TantivyDocument) -> Result<(String, Product)> {
	let text = |field: SchemaField| doc.get_first(field).and_then(|v| v.as_str()).unwrap_or("").to_string();
	let id = text(fields.id);
	let mut builder = Product::builder(text(fields.name))
		.id(id.clone())
		.description(text(fields.description))
		.manufacturer(text(fields.manufacturer))
		.category(text(fields.category));
	if let Some(price) = doc.get_first(fields.price).and_then(|v| v.as_f64()) {
		builder = builder.price(price);
	}
	Ok((id, builder.build()?))
}

/// Executes `request` against the current generation of the index. The
/// search runs synchronously inside the caller's poll.
pub(crate) fn run(handle: &IndexHandle, request: &SearchRequest) -> Result<Vec<Hit>> {
	let searcher = handle.reader.searcher();
	let num_docs = usize::try_from(searcher.num_docs()).unwrap_or(usize::MAX);
	let limit = request.size.unwrap_or(num_docs).min(num_docs);
	if limit == 0 {
		return Ok(Vec::new());
	}
	let query = compile(handle, &request.clause)?;
	let top_docs = searcher
		.search(&*query, &TopDocs::with_limit(limit))
		.map_err(|e| Error::operation("search", e))?;
	let mut hits = Vec::with_capacity(top_docs.len());
	for (score, addr) in top_docs {
		let doc: TantivyDocument = searcher.doc(addr).map_err(|e| Error::operation("load document", e))?;
		let (id, product) = to_product(&handle.fields, &doc)?;
		hits.push(Hit { id, score, product });
	}
	Ok(hits)
}
