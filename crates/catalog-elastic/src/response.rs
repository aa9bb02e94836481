use serde::Deserialize;

use catalog_core::Product;

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorCause {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ErrorCause {
    pub fn describe(&self) -> String {
        match &self.reason {
            Some(reason) => format!("{}: {}", self.kind, reason),
            None => self.kind.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorCause,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkResponse {
    #[serde(default)]
    pub errors: bool,
    pub items: Vec<BulkItem>,
}

/// Each item is keyed by its action name; only `index` actions are sent.
#[derive(Debug, Deserialize)]
pub(crate) struct BulkItem {
    pub index: BulkItemResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkItemResult {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub status: u16,
    #[serde(default)]
    pub error: Option<ErrorCause>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IndexResponse {
    #[serde(rename = "_id")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HitsEnvelope {
    #[serde(default)]
    pub hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score", default)]
    pub score: Option<f32>,
    #[serde(rename = "_source")]
    pub source: Product,
}
