//! Projection of engine hits back into typed results.

use crate::types::{Hit, Product};

/// Products in engine order, each carrying the id the engine reported.
pub fn products(hits: Vec<Hit>) -> Vec<Product> {
    hits.into_iter().map(|hit| hit.product.with_id(hit.id)).collect()
}

/// Product names in engine order, truncated to `limit`.
pub fn names(hits: Vec<Hit>, limit: usize) -> Vec<String> {
    hits.into_iter()
        .take(limit)
        .map(|hit| hit.product.name().to_string())
        .collect()
}
