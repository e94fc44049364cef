//! Error types for the transformation pipeline
//!
//! Per-key decode failures are not errors: codecs return `None` and the key
//! is dropped. Everything here aborts the run.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal pipeline errors
#[derive(Debug, Error)]
pub enum TransformError {
    /// A retain/remove filter eliminated every key
    #[error("retain/remove filtering produced an empty result")]
    EmptyResult,

    /// A mode that consults a donor set was run without one
    #[error("transformation mode '{mode}' requires a donor set (--donor)")]
    MissingDonor { mode: String },

    /// A JSON template could not be parsed
    #[error("malformed template {path:?}: {source}")]
    MalformedInput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A configuration value could not be interpreted
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransformError>;
