use tracing::{debug, info};

use crate::error::Result;
use crate::traits::SharedBackend;
use crate::types::{IndexOutcome, Product, ProductId};

/// Owns the lifecycle of one named index: reset, teardown and writes.
#[derive(Clone)]
pub struct IndexManager {
    backend: SharedBackend,
    index: String,
    batch_size: usize,
}

impl IndexManager {
    pub fn new(backend: SharedBackend, index: impl Into<String>, batch_size: usize) -> Self {
        Self { backend, index: index.into(), batch_size: batch_size.max(1) }
    }

    pub fn index_name(&self) -> &str { &self.index }

    /// Drops the index and recreates it empty.
    pub async fn reset(&self) -> Result<()> {
        self.backend.delete_index(&self.index).await?;
        self.backend.create_index(&self.index).await?;
        info!(index = %self.index, "index reset");
        Ok(())
    }

    pub async fn delete(&self) -> Result<()> {
        self.backend.delete_index(&self.index).await?;
        info!(index = %self.index, "index deleted");
        Ok(())
    }

    /// Writes `products` in batches and returns one outcome per product, in
    /// input order. A failed batch request aborts; failed items do not.
    pub async fn bulk_upsert(&self, products: &[Product]) -> Result<Vec<IndexOutcome>> {
        let mut outcomes = Vec::with_capacity(products.len());
        for batch in products.chunks(self.batch_size) {
            let batch_outcomes = self.backend.bulk_index(&self.index, batch).await?;
            debug!(index = %self.index, batch = batch.len(), "bulk batch written");
            outcomes.extend(batch_outcomes);
        }
        Ok(outcomes)
    }

    pub async fn upsert(&self, product: &Product) -> Result<ProductId> {
        self.backend.index_one(&self.index, product).await
    }
}
