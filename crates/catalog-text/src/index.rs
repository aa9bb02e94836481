use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, info};

use catalog_core::query::SearchRequest;
use catalog_core::{Error, Hit, IndexOutcome, Product, ProductId, Result, SearchBackend};

use crate::schema::{build_schema, register_tokenizers, ProductFields};

/// One generation of a named index. A reset publishes a new handle; queries
/// holding the old one finish against the old generation.
pub(crate) struct IndexHandle {
	pub(crate) index: Index,
	pub(crate) reader: IndexReader,
	writer: Mutex<Option<IndexWriter>>,
	pub(crate) fields: ProductFields,
}

impl IndexHandle {
	/// Runs `f` against the index writer, opened on first use, then commits
	/// and reloads the reader so the batch becomes visible at once.
	fn write<T>(&self, heap_bytes: usize, f: impl FnOnce(&mut IndexWriter) -> T) -> Result<T> {
		let mut slot = self.writer.lock();
		if slot.is_none() {
			// Single writer thread keeps documents in insertion order.
			let writer: IndexWriter = self
				.index
				.writer_with_num_threads(1, heap_bytes)
				.map_err(engine_err("open writer"))?;
			*slot = Some(writer);
		}
		let Some(writer) = slot.as_mut() else {
			return Err(Error::Operation("index writer unavailable".to_string()));
		};
		let value = f(writer);
		writer.commit().map_err(engine_err("commit"))?;
		self.reader.reload().map_err(engine_err("reload reader"))?;
		Ok(value)
	}
}

/// Embedded tantivy engine. Indexes live in memory, or under
/// `<root>/<index name>` when a root directory is configured.
pub struct TantivyBackend {
	root: Option<PathBuf>,
	writer_heap_bytes: usize,
	indexes: RwLock<HashMap<String, Arc<IndexHandle>>>,
}

fn engine_err(context: &str) -> impl Fn(tantivy::TantivyError) -> Error + '_ {
	move |e| Error::operation(context, e)
}

impl TantivyBackend {
	pub const DEFAULT_WRITER_HEAP: usize = 50_000_000;

	pub fn in_memory() -> Self {
		Self { root: None, writer_heap_bytes: Self::DEFAULT_WRITER_HEAP, indexes: RwLock::new(HashMap::new()) }
	}

	pub fn in_dir(root: PathBuf) -> Self {
		Self { root: Some(root), writer_heap_bytes: Self::DEFAULT_WRITER_HEAP, indexes: RwLock::new(HashMap::new()) }
	}

	#[must_use]
	pub fn with_writer_heap(mut self, bytes: usize) -> Self {
		self.writer_heap_bytes = bytes;
		self
	}

	fn index_path(&self, name: &str) -> Option<PathBuf> {
		self.root.as_ref().map(|root| root.join(name))
	}

	fn open_handle(&self, index: Index) -> Result<IndexHandle> {
		register_tokenizers(&index);
		let fields = ProductFields::from_schema(&index.schema())?;
		let reader = index
			.reader_builder()
			.reload_policy(ReloadPolicy::Manual)
			.try_into()
			.map_err(engine_err("open reader"))?;
		Ok(IndexHandle { index, reader, writer: Mutex::new(None), fields })
	}

	/// Looks the index up, reopening it from disk on first use.
	pub(crate) fn handle(&self, name: &str) -> Result<Arc<IndexHandle>> {
		if let Some(handle) = self.indexes.read().get(name) {
			return Ok(handle.clone());
		}
		let path = self
			.index_path(name)
			.filter(|p| p.join("meta.json").exists())
			.ok_or_else(|| Error::NotFound(format!("index '{name}'")))?;
		let mut indexes = self.indexes.write();
		if let Some(handle) = indexes.get(name) {
			return Ok(handle.clone());
		}
		let index = Index::open_in_dir(&path).map_err(engine_err("open index"))?;
		let handle = Arc::new(self.open_handle(index)?);
		indexes.insert(name.to_string(), handle.clone());
		debug!(index = name, path = %path.display(), "reopened index from disk");
		Ok(handle)
	}

	fn to_document(fields: &ProductFields, id: &str, product: &Product) -> TantivyDocument {
		let mut doc = TantivyDocument::default();
		doc.add_text(fields.id, id);
		doc.add_text(fields.name, product.name());
		doc.add_text(fields.name_prefix, product.name());
		doc.add_text(fields.description, product.description());
		doc.add_text(fields.manufacturer, product.manufacturer());
		doc.add_text(fields.category, product.category());
		if let Some(price) = product.price() {
			doc.add_f64(fields.price, price);
		}
		doc
	}

	/// Replaces any document with the same id. Blank ids get a fresh UUID.
	fn write_one(writer: &mut IndexWriter, fields: &ProductFields, product: &Product) -> IndexOutcome {
		if !product.is_indexable() {
			return IndexOutcome::Failed { id: product.id().map(str::to_string), reason: "product name is empty".to_string() };
		}
		let id = product.id().map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);
		writer.delete_term(Term::from_field_text(fields.id, &id));
		match writer.add_document(Self::to_document(fields, &id, product)) {
			Ok(_) => IndexOutcome::Indexed { id },
			Err(e) => IndexOutcome::Failed { id: Some(id), reason: e.to_string() },
		}
	}
}

#[async_trait]
impl SearchBackend for TantivyBackend {
	async fn create_index(&self, index: &str) -> Result<()> {
		let mut indexes = self.indexes.write();
		if indexes.contains_key(index) {
			return Err(Error::Operation(format!("index '{index}' already exists")));
		}
		let schema = build_schema();
		let tantivy_index = match self.index_path(index) {
			Some(path) => {
				if path.exists() { std::fs::remove_dir_all(&path)?; }
				std::fs::create_dir_all(&path)?;
				Index::create_in_dir(&path, schema).map_err(engine_err("create index"))?
			}
			None => Index::create_in_ram(schema),
		};
		let handle = Arc::new(self.open_handle(tantivy_index)?);
		indexes.insert(index.to_string(), handle);
		info!(index, "index created");
		Ok(())
	}

	async fn delete_index(&self, index: &str) -> Result<()> {
		let existed = self.indexes.write().remove(index).is_some();
		if let Some(path) = self.index_path(index) {
			if path.exists() { std::fs::remove_dir_all(&path)?; }
		}
		debug!(index, existed, "index deleted");
		Ok(())
	}

	async fn bulk_index(&self, index: &str, products: &[Product]) -> Result<Vec<IndexOutcome>> {
		let handle = self.handle(index)?;
		let fields = handle.fields;
		handle.write(self.writer_heap_bytes, |writer| {
			products.iter().map(|product| Self::write_one(writer, &fields, product)).collect()
		})
	}

	async fn index_one(&self, index: &str, product: &Product) -> Result<ProductId> {
		let handle = self.handle(index)?;
		let fields = handle.fields;
		match handle.write(self.writer_heap_bytes, |writer| Self::write_one(writer, &fields, product))? {
			IndexOutcome::Indexed { id } => Ok(id),
			IndexOutcome::Failed { reason, .. } => Err(Error::InvalidDocument(reason)),
		}
	}

	async fn search(&self, index: &str, request: &SearchRequest) -> Result<Vec<Hit>> {
		let handle = self.handle(index)?;
		crate::search::run(&handle, request)
	}
}
