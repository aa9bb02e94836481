//! Shared plumbing for the `catalog` binary: engine selection, logging setup
//! and the interactive shell's command grammar.

use std::process::ExitCode;
use std::sync::Arc;

use catalog_core::config::{CatalogConfig, EngineKind};
use catalog_core::{Catalog, Error, Product, ProductSearch, SharedBackend};
use catalog_elastic::ElasticBackend;
use catalog_text::TantivyBackend;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// Builds the configured engine. The embedded engine persists under
/// `engine.index_dir` when set and is in memory otherwise.
pub fn backend_from_config(config: &CatalogConfig) -> catalog_core::Result<SharedBackend> {
    match config.engine.kind {
        EngineKind::Tantivy => {
            let backend = match config.index_dir() {
                Some(dir) => TantivyBackend::in_dir(dir),
                None => TantivyBackend::in_memory(),
            };
            Ok(Arc::new(backend.with_writer_heap(config.engine.writer_heap_bytes)))
        }
        EngineKind::Elasticsearch => Ok(Arc::new(ElasticBackend::from_config(config)?)),
    }
}

/// `RUST_LOG` wins; otherwise `info`. Logs go to stderr so stdout stays JSON.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Search(String),
    Suggest(String),
    Filter { manufacturer: String, category: String },
    Price { above: f64, below: f64 },
    Manufacturer(String),
    Name(String),
    Contains(String),
    Help,
    Quit,
}

impl ShellCommand {
    pub const USAGE: &'static str = "commands: search <text> | suggest <prefix> | filter <manufacturer>;<category> | \
        price <above> <below> | manufacturer <name> | name <name> | contains <text> | help | quit";

    /// Parses one input line. `None` means the line is not a command.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        match verb {
            "search" => Some(Self::Search(rest.to_string())),
            "suggest" => Some(Self::Suggest(rest.to_string())),
            "filter" => {
                let (manufacturer, category) = rest.split_once(';')?;
                Some(Self::Filter { manufacturer: manufacturer.trim().to_string(), category: category.trim().to_string() })
            }
            "price" => {
                let mut bounds = rest.split_whitespace().map(str::parse::<f64>);
                let (Some(Ok(above)), Some(Ok(below)), None) = (bounds.next(), bounds.next(), bounds.next()) else {
                    return None;
                };
                Some(Self::Price { above, below })
            }
            "manufacturer" => Some(Self::Manufacturer(rest.to_string())),
            "name" => Some(Self::Name(rest.to_string())),
            "contains" => Some(Self::Contains(rest.to_string())),
            "help" => Some(Self::Help),
            "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }

    /// Runs a query command and renders its result as JSON.
    pub async fn execute(&self, search: &ProductSearch) -> catalog_core::Result<String> {
        let products = match self {
            Self::Search(text) => search.search(text).await?,
            Self::Suggest(prefix) => return Ok(to_json(&search.suggest(prefix).await?)),
            Self::Filter { manufacturer, category } => search.filter_by_manufacturer_and_category(manufacturer, category).await?,
            Self::Price { above, below } => search.filter_by_price_range(*above, *below).await?,
            Self::Manufacturer(name) => search.find_by_manufacturer(name).await?,
            Self::Name(name) => search.find_by_name(name).await?,
            Self::Contains(text) => search.find_by_name_containing(text).await?,
            Self::Help => return Ok(Self::USAGE.to_string()),
            Self::Quit => return Ok(String::new()),
        };
        Ok(products_json(&products))
    }
}

/// Prints the query result. A failed query prints an empty list and signals
/// failure by exit status.
pub async fn run_query(query: &ShellCommand, search: &ProductSearch) -> ExitCode {
    match query.execute(search).await {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "query failed");
            println!("[]");
            ExitCode::FAILURE
        }
    }
}

/// Answers commands from `input` until `quit` or end of input, then shuts the
/// catalog down. A read error ends the session after the shutdown has run.
pub async fn run_session<R: AsyncBufRead + Unpin>(catalog: Catalog, input: R) -> catalog_core::Result<()> {
    let read = answer_commands(input, catalog.search()).await;
    catalog.shutdown().await?;
    read.map_err(Error::from)
}

async fn answer_commands<R: AsyncBufRead + Unpin>(input: R, search: &ProductSearch) -> std::io::Result<()> {
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match ShellCommand::parse(&line) {
            Some(ShellCommand::Quit) => break,
            Some(command) => {
                run_query(&command, search).await;
            }
            None => warn!(input = %line, "unrecognised command"),
        }
    }
    Ok(())
}

pub fn products_json(products: &[Product]) -> String { to_json(products) }

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}
