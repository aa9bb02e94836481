//! Delimited product dataset loading.
//!
//! Loading is best effort: malformed rows are skipped with a debug
//! diagnostic and an unreadable source yields an empty dataset.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, error, info};

use crate::config::DatasetConfig;
use crate::types::Product;

/// Column positions used to map a row onto a product. The first three are
/// positional and fixed; category and price are only read when configured.
#[derive(Debug, Clone, Copy)]
pub struct ColumnLayout {
    pub category: Option<usize>,
    pub price: Option<usize>,
}

const NAME: usize = 0;
const DESCRIPTION: usize = 1;
const MANUFACTURER: usize = 2;
const REQUIRED_COLUMNS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    TooFewFields { found: usize },
    EmptyName,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewFields { found } => write!(f, "expected at least {REQUIRED_COLUMNS} fields, found {found}"),
            Self::EmptyName => write!(f, "name is empty"),
        }
    }
}

#[derive(Debug, Default)]
pub struct Dataset {
    pub products: Vec<Product>,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct DatasetLoader {
    delimiter: char,
    has_header: bool,
    layout: ColumnLayout,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self { delimiter: ',', has_header: true, layout: ColumnLayout { category: None, price: None } }
    }
}

impl DatasetLoader {
    pub fn new() -> Self { Self::default() }

    pub fn from_config(config: &DatasetConfig) -> Self {
        Self {
            delimiter: config.delimiter,
            has_header: config.has_header,
            layout: ColumnLayout { category: config.category_column, price: config.price_column },
        }
    }

    pub fn load_path(&self, path: &Path) -> Dataset {
        match File::open(path) {
            Ok(file) => {
                let dataset = self.load_reader(BufReader::new(file));
                info!(path = %path.display(), loaded = dataset.products.len(), skipped = dataset.skipped, "dataset loaded");
                dataset
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to open dataset");
                Dataset::default()
            }
        }
    }

    /// Reads rows until EOF or the first I/O error, keeping what was read.
    /// Rows that are not valid UTF-8 are skipped like any malformed row.
    pub fn load_reader<R: BufRead>(&self, reader: R) -> Dataset {
        let mut dataset = Dataset::default();
        for (line_no, raw) in reader.split(b'\n').enumerate() {
            let mut raw = match raw {
                Ok(raw) => raw,
                Err(e) => {
                    error!(line = line_no + 1, error = %e, "dataset read failed; keeping rows read so far");
                    break;
                }
            };
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }
            let line = match String::from_utf8(raw) {
                Ok(line) => line,
                Err(e) => {
                    debug!(line = line_no + 1, error = %e, "skipping dataset row that is not UTF-8");
                    if line_no > 0 || !self.has_header {
                        dataset.skipped += 1;
                    }
                    continue;
                }
            };
            if line_no == 0 && self.has_header { continue; }
            if line.trim().is_empty() { continue; }
            match self.map_row(&line) {
                Ok(product) => dataset.products.push(product),
                Err(reason) => {
                    debug!(line = line_no + 1, %reason, "skipping dataset row");
                    dataset.skipped += 1;
                }
            }
        }
        dataset
    }

    pub fn map_row(&self, line: &str) -> Result<Product, RowError> {
        let fields: Vec<&str> = line.split(self.delimiter).map(str::trim).collect();
        if fields.len() < REQUIRED_COLUMNS {
            return Err(RowError::TooFewFields { found: fields.len() });
        }
        let mut builder = Product::builder(fields[NAME])
            .description(fields[DESCRIPTION])
            .manufacturer(fields[MANUFACTURER]);
        if let Some(category) = self.layout.category.and_then(|i| fields.get(i)) {
            builder = builder.category(*category);
        }
        if let Some(raw) = self.layout.price.and_then(|i| fields.get(i)) {
            match raw.parse::<f64>() {
                Ok(price) if price.is_finite() => builder = builder.price(price),
                _ => debug!(value = *raw, "unparsable price; leaving it empty"),
            }
        }
        builder.build().map_err(|_| RowError::EmptyName)
    }
}
