//! Error types for idiom-core.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the progress store.
///
/// Every variant means the storage is unavailable for the operation in
/// progress. Nothing is retried and nothing falls back to memory.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("storage unavailable: cannot create {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage unavailable: connection lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures while loading the reference dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("cannot read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate idiom id {0}")]
    DuplicateId(i64),
}

pub type DatasetResult<T> = Result<T, DatasetError>;
