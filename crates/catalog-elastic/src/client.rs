use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use catalog_core::config::CatalogConfig;
use catalog_core::query::SearchRequest;
use catalog_core::{Error, Hit, IndexOutcome, Product, ProductId, Result, SearchBackend};

use crate::dsl;
use crate::response::{BulkItemResult, BulkResponse, ErrorResponse, IndexResponse, SearchResponse};

const ALREADY_EXISTS: &str = "resource_already_exists_exception";

/// Elasticsearch engine. Writes ask for `refresh=wait_for` so they are
/// searchable when the call returns.
#[derive(Clone)]
pub struct ElasticBackend {
    client: Client,
    base_url: Url,
    max_results: usize,
}

fn http_err(context: &'static str) -> impl Fn(reqwest::Error) -> Error {
    move |e| Error::operation(context, e)
}

/// Turns a non-success response into an error carrying the server's reason.
async fn failure(context: &str, response: Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let reason = serde_json::from_str::<ErrorResponse>(&body).map_or(body, |r| r.error.describe());
    Error::Operation(format!("{context}: HTTP {status}: {reason}"))
}

async fn decode<T: DeserializeOwned>(context: &str, response: Response) -> Result<T> {
    let body = response.bytes().await.map_err(|e| Error::operation(context, e))?;
    serde_json::from_slice(&body).map_err(|e| Error::operation(context, e))
}

impl ElasticBackend {
    pub fn new(base_url: &str, timeout: Duration, max_results: usize) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::InvalidConfig(format!("engine.url '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!("engine.url '{base_url}' is not a base URL")));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, base_url, max_results })
    }

    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        Self::new(&config.engine.url, Duration::from_secs(config.engine.timeout_secs), config.search.max_results)
    }

    /// Base URL plus percent-encoded path segments.
    fn endpoint(&self, segments: &[&str], refresh: bool) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if refresh {
            url.query_pairs_mut().append_pair("refresh", "wait_for");
        }
        url
    }

    fn outcome(product: &Product, item: BulkItemResult) -> IndexOutcome {
        let id = item.id.or_else(|| product.id().map(str::to_string));
        match (item.status, item.error) {
            (200..=299, None) => match id {
                Some(id) => IndexOutcome::Indexed { id },
                None => IndexOutcome::Failed { id: None, reason: "engine returned no id".to_string() },
            },
            (status, error) => IndexOutcome::Failed {
                id,
                reason: error.map_or_else(|| format!("HTTP {status}"), |e| e.describe()),
            },
        }
    }
}

#[async_trait]
impl SearchBackend for ElasticBackend {
    async fn create_index(&self, index: &str) -> Result<()> {
        let response = self
            .client
            .put(self.endpoint(&[index], false))
            .json(&dsl::mappings())
            .send()
            .await
            .map_err(http_err("create index"))?;
        if response.status().is_success() {
            info!(index, "index created");
            return Ok(());
        }
        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(r) if r.error.kind == ALREADY_EXISTS => Err(Error::Operation(format!("index '{index}' already exists"))),
                Ok(r) => Err(Error::Operation(format!("create index: {}", r.error.describe()))),
                Err(_) => Err(Error::Operation(format!("create index: HTTP 400: {body}"))),
            };
        }
        Err(failure("create index", response).await)
    }

    async fn delete_index(&self, index: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.endpoint(&[index], false))
            .send()
            .await
            .map_err(http_err("delete index"))?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            debug!(index, existed = status.is_success(), "index deleted");
            return Ok(());
        }
        Err(failure("delete index", response).await)
    }

    async fn bulk_index(&self, index: &str, products: &[Product]) -> Result<Vec<IndexOutcome>> {
        let mut outcomes: Vec<Option<IndexOutcome>> = Vec::with_capacity(products.len());
        let mut sendable: Vec<&Product> = Vec::new();
        for product in products {
            if product.is_indexable() {
                outcomes.push(None);
                sendable.push(product);
            } else {
                outcomes.push(Some(IndexOutcome::Failed {
                    id: product.id().map(str::to_string),
                    reason: "product name is empty".to_string(),
                }));
            }
        }

        if !sendable.is_empty() {
            let response = self
                .client
                .post(self.endpoint(&["_bulk"], true))
                .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
                .body(dsl::bulk_body(index, &sendable)?)
                .send()
                .await
                .map_err(http_err("bulk index"))?;
            if !response.status().is_success() {
                return Err(failure("bulk index", response).await);
            }
            let bulk: BulkResponse = decode("bulk response", response).await?;
            if bulk.items.len() != sendable.len() {
                return Err(Error::Operation(format!(
                    "bulk response has {} items for {} documents",
                    bulk.items.len(),
                    sendable.len()
                )));
            }
            if bulk.errors {
                warn!(index, "bulk request completed with item errors");
            }
            let mut items = sendable.iter().zip(bulk.items).map(|(p, item)| Self::outcome(p, item.index));
            for slot in outcomes.iter_mut().filter(|slot| slot.is_none()) {
                *slot = items.next();
            }
        }

        debug!(index, documents = products.len(), "bulk index finished");
        Ok(outcomes
            .into_iter()
            .map(|o| o.unwrap_or(IndexOutcome::Failed { id: None, reason: "missing bulk item".to_string() }))
            .collect())
    }

    async fn index_one(&self, index: &str, product: &Product) -> Result<ProductId> {
        if !product.is_indexable() {
            return Err(Error::InvalidDocument("product name is empty".to_string()));
        }
        let request = match product.id() {
            Some(id) => self.client.put(self.endpoint(&[index, "_doc", id], true)),
            None => self.client.post(self.endpoint(&[index, "_doc"], true)),
        };
        let response = request.json(product).send().await.map_err(http_err("index document"))?;
        if !response.status().is_success() {
            return Err(failure("index document", response).await);
        }
        let indexed: IndexResponse = decode("index response", response).await?;
        Ok(indexed.id)
    }

    async fn search(&self, index: &str, request: &SearchRequest) -> Result<Vec<Hit>> {
        let response = self
            .client
            .post(self.endpoint(&[index, "_search"], false))
            .json(&dsl::search_body(request, self.max_results))
            .send()
            .await
            .map_err(http_err("search"))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("index '{index}'")));
        }
        if !response.status().is_success() {
            return Err(failure("search", response).await);
        }
        let found: SearchResponse = decode("search response", response).await?;
        Ok(found
            .hits
            .hits
            .into_iter()
            .map(|hit| Hit { id: hit.id, score: hit.score.unwrap_or(0.0), product: hit.source })
            .collect())
    }
}
