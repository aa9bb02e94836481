//! catalog-elastic
//!
//! Remote engine speaking the Elasticsearch REST protocol. Requests are built
//! from the backend-neutral [`catalog_core::query::SearchRequest`] in [`dsl`]
//! and sent by [`ElasticBackend`].

pub mod client;
pub mod dsl;
mod response;

pub use client::ElasticBackend;
