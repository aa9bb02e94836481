use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn operation(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Operation(format!("{context}: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
