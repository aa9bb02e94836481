use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::BufReader;
use tracing::info;

use catalog_cli::{backend_from_config, init_tracing, run_query, run_session, ShellCommand};
use catalog_core::config::CatalogConfig;
use catalog_core::{Catalog, IndexManager, ProductSearch, SharedBackend};

#[derive(Parser)]
#[command(name = "catalog", about = "Product catalog indexing and search")]
struct Cli {
    /// Index to operate on; defaults to `index.name` from config.
    #[arg(long, global = true, env = "CATALOG_INDEX")]
    index: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the index from the configured dataset and keep it.
    Index,
    /// Fuzzy full-text search over name and description.
    Search { text: String },
    /// Product names starting with a prefix.
    Suggest {
        #[arg(default_value = "")]
        prefix: String,
    },
    /// Exact manufacturer and category match.
    Filter {
        #[arg(long)]
        manufacturer: String,
        #[arg(long)]
        category: String,
    },
    /// Products priced strictly between two bounds.
    Price {
        #[arg(long)]
        above: f64,
        #[arg(long)]
        below: f64,
    },
    /// Exact manufacturer match.
    Manufacturer { name: String },
    /// Non-fuzzy name match.
    Name { name: String },
    /// Names containing a substring, ignoring case.
    Contains { text: String },
    /// Drop and recreate an empty index.
    Reset,
    /// Delete the index.
    Drop,
    /// Index the dataset, answer queries from stdin, then tear down.
    Shell,
}

impl Command {
    fn as_query(&self) -> Option<ShellCommand> {
        Some(match self {
            Self::Search { text } => ShellCommand::Search(text.clone()),
            Self::Suggest { prefix } => ShellCommand::Suggest(prefix.clone()),
            Self::Filter { manufacturer, category } => {
                ShellCommand::Filter { manufacturer: manufacturer.clone(), category: category.clone() }
            }
            Self::Price { above, below } => ShellCommand::Price { above: *above, below: *below },
            Self::Manufacturer { name } => ShellCommand::Manufacturer(name.clone()),
            Self::Name { name } => ShellCommand::Name(name.clone()),
            Self::Contains { text } => ShellCommand::Contains(text.clone()),
            _ => return None,
        })
    }
}

async fn initialize(backend: SharedBackend, config: &CatalogConfig) -> anyhow::Result<Catalog> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(format!("indexing {}", config.dataset_path().display()));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let catalog = Catalog::initialize(backend, config).await;
    spinner.finish_and_clear();
    let catalog = catalog.context("startup indexing failed")?;
    let report = catalog.report();
    eprintln!(
        "Indexed {} of {} products into '{}' ({} failed, {} rows skipped)",
        report.indexed,
        report.loaded,
        catalog.index().index_name(),
        report.failed,
        report.skipped_rows
    );
    Ok(catalog)
}

async fn shell(backend: SharedBackend, config: &CatalogConfig) -> anyhow::Result<()> {
    let catalog = initialize(backend, config).await?;
    eprintln!("{}", ShellCommand::USAGE);
    run_session(catalog, BufReader::new(tokio::io::stdin())).await.context("shell session")
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let mut config = CatalogConfig::load().context("loading configuration")?;
    if let Some(index) = cli.index {
        config.index.name = index;
    }
    let backend = backend_from_config(&config)?;
    info!(engine = ?config.engine.kind, index = %config.index.name, "catalog starting");

    if let Some(query) = cli.command.as_query() {
        let search = ProductSearch::new(backend, config.index.name.clone(), config.search.suggestion_limit);
        return Ok(run_query(&query, &search).await);
    }

    let manager = IndexManager::new(backend.clone(), config.index.name.clone(), config.index.bulk_batch_size);
    match cli.command {
        Command::Index => {
            initialize(backend, &config).await?;
        }
        Command::Reset => {
            manager.reset().await?;
            eprintln!("Index '{}' reset", manager.index_name());
        }
        Command::Drop => {
            manager.delete().await?;
            eprintln!("Index '{}' deleted", manager.index_name());
        }
        Command::Shell => shell(backend, &config).await?,
        _ => {}
    }
    Ok(ExitCode::SUCCESS)
}
