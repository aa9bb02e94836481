use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub index: IndexConfig,
    pub dataset: DatasetConfig,
    pub engine: EngineConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub name: String,
    pub bulk_batch_size: usize,
    pub drop_on_shutdown: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { name: "productindex".to_string(), bulk_batch_size: 500, drop_on_shutdown: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub path: String,
    pub delimiter: char,
    pub has_header: bool,
    pub category_column: Option<usize>,
    pub price_column: Option<usize>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: "data/fashion-products.csv".to_string(),
            delimiter: ',',
            has_header: true,
            category_column: None,
            price_column: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Tantivy,
    Elasticsearch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub kind: EngineKind,
    /// Base URL of the remote engine.
    pub url: String,
    pub timeout_secs: u64,
    /// On-disk root for embedded indexes; in memory when unset.
    pub index_dir: Option<String>,
    pub writer_heap_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::Tantivy,
            url: "http://localhost:9200".to_string(),
            timeout_secs: 30,
            index_dir: None,
            writer_heap_bytes: 50_000_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub suggestion_limit: usize,
    /// Page size used by engines that cannot return unbounded result sets.
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { suggestion_limit: 5, max_results: 10_000 }
    }
}

impl CatalogConfig {
    /// Merges defaults, `config.toml`, `config.<env>.toml` (by `RUST_ENV`)
    /// and `APP_*` env vars, `__` separating nested keys.
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Self::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Self::from_figment(&figment)
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.index.name.trim().is_empty() {
            return Err(Error::InvalidConfig("index.name must not be empty".to_string()));
        }
        if self.index.bulk_batch_size == 0 {
            return Err(Error::InvalidConfig("index.bulk_batch_size must be positive".to_string()));
        }
        if self.search.suggestion_limit == 0 {
            return Err(Error::InvalidConfig("search.suggestion_limit must be positive".to_string()));
        }
        Ok(())
    }

    pub fn dataset_path(&self) -> PathBuf { expand_path(&self.dataset.path) }

    pub fn index_dir(&self) -> Option<PathBuf> { self.engine.index_dir.as_deref().map(expand_path) }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
