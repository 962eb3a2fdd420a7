//! Error types for catalog operations.

use std::path::PathBuf;
use thiserror::Error;

use songset_media::MediaError;
use songset_sources::SourceError;

/// Result type for catalog operations.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Errors that can occur while reading, updating or writing the catalog.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Catalog not found: {0}")]
    CatalogNotFound(PathBuf),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source API error: {0}")]
    Source(#[from] SourceError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),
}

impl DatasetError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}
