use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::query::SearchRequest;
use crate::types::{Hit, IndexOutcome, Product, ProductId};

/// The document engine the catalog talks to.
///
/// Every operation addresses a named index. Dropping a returned future
/// cancels the engine call.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Fails with `Error::Operation` when the index already exists.
    async fn create_index(&self, index: &str) -> Result<()>;

    /// Deleting a missing index is not an error.
    async fn delete_index(&self, index: &str) -> Result<()>;

    /// Inserts or replaces `products` in one request. Outcomes follow input
    /// order; a failed item never aborts the others.
    async fn bulk_index(&self, index: &str, products: &[Product]) -> Result<Vec<IndexOutcome>>;

    /// Inserts or replaces one product and returns its id.
    async fn index_one(&self, index: &str, product: &Product) -> Result<ProductId>;

    /// Ranked hits, best first. Fails with `Error::NotFound` for a missing index.
    async fn search(&self, index: &str, request: &SearchRequest) -> Result<Vec<Hit>>;
}

pub type SharedBackend = Arc<dyn SearchBackend>;
