//! catalog-text
//!
//! Embedded tantivy engine for the product catalog. `TantivyBackend`
//! implements `catalog_core::SearchBackend`; `schema` holds the field layout
//! and analyzers, `search` compiles requests into tantivy queries.
pub mod schema;
pub mod index;
mod search;

pub use index::TantivyBackend;
