use tracing::{info, warn};

use crate::config::CatalogConfig;
use crate::dataset::DatasetLoader;
use crate::error::Result;
use crate::index::IndexManager;
use crate::search::ProductSearch;
use crate::traits::SharedBackend;
use crate::types::IndexOutcome;

/// Counts from one startup indexing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub loaded: usize,
    pub skipped_rows: usize,
    pub indexed: usize,
    pub failed: usize,
}

/// An indexed catalog. The only way to obtain one is [`Catalog::initialize`],
/// so a `ProductSearch` never exists before startup indexing has finished.
pub struct Catalog {
    manager: IndexManager,
    search: ProductSearch,
    report: IndexReport,
    drop_on_shutdown: bool,
}

impl Catalog {
    /// Rebuilds the index from the configured dataset. Failing to reset the
    /// index or to send a bulk request is fatal; per-product failures are
    /// logged and counted.
    pub async fn initialize(backend: SharedBackend, config: &CatalogConfig) -> Result<Self> {
        config.validate()?;
        let manager = IndexManager::new(backend.clone(), config.index.name.clone(), config.index.bulk_batch_size);
        manager.reset().await?;

        let dataset = DatasetLoader::from_config(&config.dataset).load_path(&config.dataset_path());
        let outcomes = manager.bulk_upsert(&dataset.products).await?;

        let mut report = IndexReport { loaded: dataset.products.len(), skipped_rows: dataset.skipped, ..IndexReport::default() };
        for outcome in &outcomes {
            match outcome {
                IndexOutcome::Indexed { .. } => report.indexed += 1,
                IndexOutcome::Failed { id, reason } => {
                    report.failed += 1;
                    warn!(id = id.as_deref().unwrap_or("-"), %reason, "product not indexed");
                }
            }
        }
        info!(
            index = %config.index.name,
            loaded = report.loaded,
            indexed = report.indexed,
            failed = report.failed,
            skipped_rows = report.skipped_rows,
            "catalog initialized"
        );

        let search = ProductSearch::new(backend, config.index.name.clone(), config.search.suggestion_limit);
        Ok(Self { manager, search, report, drop_on_shutdown: config.index.drop_on_shutdown })
    }

    pub fn search(&self) -> &ProductSearch { &self.search }

    pub fn index(&self) -> &IndexManager { &self.manager }

    pub fn report(&self) -> IndexReport { self.report }

    /// Tears the index down when configured to; the next startup rebuilds it.
    pub async fn shutdown(self) -> Result<()> {
        if self.drop_on_shutdown {
            self.manager.delete().await?;
        }
        info!(index = %self.manager.index_name(), "catalog shut down");
        Ok(())
    }
}
