//! Error types for each stage of the conversion pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::{Cmip6Model, Cmip6Variable};

/// A failed download attempt.
///
/// Only `NotFound` on a mirror that is not the last one is recovered from;
/// every other kind stops the mirror loop.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Resource not found: {url}")]
    NotFound { url: String },

    #[error("Server returned {status} for {url}")]
    ServerError { url: String, status: u16 },

    #[error("Timed out downloading {url}")]
    Timeout { url: String },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Cannot write download to disk: {0}")]
    Io(#[from] std::io::Error),

    #[error("No mirrors configured")]
    NoMirrors,
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Cannot open source file {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("Variable `{name}` not found in {path}")]
    MissingVariable { name: String, path: PathBuf },

    #[error("Variable `{name}` in {path} is not a floating point variable")]
    WrongType { name: String, path: PathBuf },

    #[error("Shape mismatch for `{name}`: expected {expected} values, got {got}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Variable `{name}` has {count} dimensions, expected (time, y, x) or (y, x)")]
    UnsupportedDimensions { name: String, count: usize },

    #[error("Cannot read `{name}`: {message}")]
    Read { name: String, message: String },
}

#[derive(Error, Debug)]
pub enum DeriveError {
    #[error("Shape mismatch for {input}: expected {expected} values, got {got}")]
    ShapeMismatch {
        input: &'static str,
        expected: usize,
        got: usize,
    },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Cannot persist {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid array shape: {0}")]
    InvalidShape(String),

    #[error("Missing or invalid metadata `{key}` in {path}")]
    Metadata { key: &'static str, path: PathBuf },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown model `{0}`")]
    UnknownModel(String),

    #[error("No granularity defined for {variable} on {model}")]
    UndefinedGranularity {
        model: Cmip6Model,
        variable: Cmip6Variable,
    },

    #[error("{0} has no orography versions, elevation is unavailable")]
    MissingElevation(Cmip6Model),

    #[error("Invalid year range {start}..={end}")]
    InvalidYearRange { start: i32, end: i32 },

    #[error("Cannot determine the home directory, pass --data-dir")]
    NoHomeDirectory,
}

/// Why a single job ended in the `Failed` state.
#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Derive(#[from] DeriveError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Elevation grid for {model} unavailable: {reason}")]
    ElevationUnavailable { model: Cmip6Model, reason: String },

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
