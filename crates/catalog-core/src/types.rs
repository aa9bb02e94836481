//! Domain types shared by the loader, the engines and the search facade.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type ProductId = String;

/// One indexable catalog record.
///
/// - `id`: engine identity; `None` until the engine assigns one
/// - `name`: primary full-text target and the only suggestion field
/// - `description`: secondary full-text target
/// - `manufacturer`/`category`: exact-match filter fields
/// - `price`: numeric range filter field
///
/// Products are immutable once built. Replacing a product means indexing a
/// new value under the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<ProductId>,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    manufacturer: String,
    #[serde(default)]
    category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    price: Option<f64>,
}

impl Product {
    pub fn builder(name: impl Into<String>) -> ProductBuilder {
        ProductBuilder { name: name.into(), ..ProductBuilder::default() }
    }

    pub fn id(&self) -> Option<&str> { self.id.as_deref() }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> &str { &self.description }
    pub fn manufacturer(&self) -> &str { &self.manufacturer }
    pub fn category(&self) -> &str { &self.category }
    pub fn price(&self) -> Option<f64> { self.price }

    /// Returns a copy carrying the engine-assigned id.
    #[must_use]
    pub fn with_id(self, id: impl Into<ProductId>) -> Self {
        Self { id: Some(id.into()), ..self }
    }

    /// A product is indexable only with a non-blank name. Deserialized
    /// values bypass the builder, so engines check this again on write.
    pub fn is_indexable(&self) -> bool { !self.name.trim().is_empty() }
}

impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => {
                self.id == other.id
                    && self.name == other.name
                    && self.description == other.description
                    && self.manufacturer == other.manufacturer
                    && self.category == other.category
                    && self.price == other.price
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductBuilder {
    id: Option<ProductId>,
    name: String,
    description: String,
    manufacturer: String,
    category: String,
    price: Option<f64>,
}

impl ProductBuilder {
    pub fn id(mut self, id: impl Into<ProductId>) -> Self { self.id = Some(id.into()); self }
    pub fn description(mut self, description: impl Into<String>) -> Self { self.description = description.into(); self }
    pub fn manufacturer(mut self, manufacturer: impl Into<String>) -> Self { self.manufacturer = manufacturer.into(); self }
    pub fn category(mut self, category: impl Into<String>) -> Self { self.category = category.into(); self }
    pub fn price(mut self, price: f64) -> Self { self.price = Some(price); self }

    pub fn build(self) -> Result<Product> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidDocument("product name must not be empty".to_string()));
        }
        let id = self.id.filter(|id| !id.trim().is_empty());
        Ok(Product {
            id,
            name: self.name,
            description: self.description,
            manufacturer: self.manufacturer,
            category: self.category,
            price: self.price,
        })
    }
}

/// One ranked match returned by an engine. `score` is engine-specific but
/// higher is always better; filter queries may report a constant score.
#[derive(Debug, Clone)]
pub struct Hit {
    pub id: ProductId,
    pub score: f32,
    pub product: Product,
}

/// Per-document result of a bulk write, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    Indexed { id: ProductId },
    Failed { id: Option<ProductId>, reason: String },
}

impl IndexOutcome {
    pub fn is_indexed(&self) -> bool { matches!(self, Self::Indexed { .. }) }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Indexed { id } => Some(id),
            Self::Failed { id, .. } => id.as_deref(),
        }
    }
}
