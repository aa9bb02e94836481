//! catalog-core
//!
//! Product model, dataset loading, query construction and the search facade.
//! Engines plug in through [`traits::SearchBackend`]; see `catalog-text` for
//! the embedded tantivy engine and `catalog-elastic` for the remote one.

pub mod catalog;
pub mod config;
pub mod dataset;
pub mod error;
pub mod index;
pub mod mapper;
pub mod query;
pub mod search;
pub mod traits;
pub mod types;

pub use catalog::{Catalog, IndexReport};
pub use error::{Error, Result};
pub use index::IndexManager;
pub use search::ProductSearch;
pub use traits::{SearchBackend, SharedBackend};
pub use types::{Hit, IndexOutcome, Product, ProductId};
