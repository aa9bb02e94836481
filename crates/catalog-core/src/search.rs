use tracing::debug;

use crate::error::Result;
use crate::mapper;
use crate::query::{QueryBuilder, SearchRequest};
use crate::traits::SharedBackend;
use crate::types::{Hit, Product};

/// Read-only query entry point used by request handlers.
#[derive(Clone)]
pub struct ProductSearch {
    backend: SharedBackend,
    index: String,
    suggestion_limit: usize,
}

impl ProductSearch {
    pub fn new(backend: SharedBackend, index: impl Into<String>, suggestion_limit: usize) -> Self {
        Self { backend, index: index.into(), suggestion_limit }
    }

    /// Fuzzy full-text search over name and description.
    pub async fn search(&self, text: &str) -> Result<Vec<Product>> {
        debug!(query = text, "search");
        let hits = self.execute(&QueryBuilder::full_text(text)).await?;
        Ok(mapper::products(hits))
    }

    /// Up to `suggestion_limit` product names starting with `prefix`.
    pub async fn suggest(&self, prefix: &str) -> Result<Vec<String>> {
        debug!(prefix, "suggest");
        let hits = self.execute(&QueryBuilder::suggestions(prefix, self.suggestion_limit)).await?;
        Ok(mapper::names(hits, self.suggestion_limit))
    }

    pub async fn filter_by_manufacturer_and_category(&self, manufacturer: &str, category: &str) -> Result<Vec<Product>> {
        let hits = self.execute(&QueryBuilder::manufacturer_and_category(manufacturer, category)).await?;
        Ok(mapper::products(hits))
    }

    /// Products priced strictly between `lower` and `upper`.
    pub async fn filter_by_price_range(&self, lower: f64, upper: f64) -> Result<Vec<Product>> {
        let hits = self.execute(&QueryBuilder::price_range(lower, upper)).await?;
        Ok(mapper::products(hits))
    }

    pub async fn find_by_manufacturer(&self, manufacturer: &str) -> Result<Vec<Product>> {
        let hits = self.execute(&QueryBuilder::by_manufacturer(manufacturer)).await?;
        Ok(mapper::products(hits))
    }

    /// Products whose name contains `text`, ignoring case.
    pub async fn find_by_name_containing(&self, text: &str) -> Result<Vec<Product>> {
        let hits = self.execute(&QueryBuilder::name_containing(text)).await?;
        Ok(mapper::products(hits))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Vec<Product>> {
        let hits = self.execute(&QueryBuilder::by_name(name)).await?;
        Ok(mapper::products(hits))
    }

    async fn execute(&self, request: &SearchRequest) -> Result<Vec<Hit>> {
        if request.matches_nothing() {
            return Ok(Vec::new());
        }
        self.backend.search(&self.index, request).await
    }
}
