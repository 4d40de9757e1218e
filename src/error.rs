use std::path::PathBuf;
use thiserror::Error;

/// Failures that cost a single input file its rows but not the batch
#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: simd_json::Error,
    },

    #[error("unexpected document shape in {path}: {detail}")]
    UnexpectedShape { path: PathBuf, detail: String },
}

pub type Result<T> = std::result::Result<T, FlattenError>;
