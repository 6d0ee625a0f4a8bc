//! Error taxonomy for a generation run.
//!
//! Every variant is fatal: the pipeline is a deterministic batch transform and
//! the only recovery path is fixing the input and running again.
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    /// Malformed definition file or a missing required attribute.
    #[error("invalid VSS file '{}': {cause}", file.display())]
    Format { file: PathBuf, cause: String },

    /// Nothing usable to work on, reported before any parsing happens.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A broken assumption inside the pipeline; well-formed input never gets here.
    #[error("internal invariant violated: {0}")]
    Invariant(String),

    #[error("i/o error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type GenResult<T> = Result<T, GenError>;

impl GenError {
    pub fn format(file: impl AsRef<Path>, cause: impl Into<String>) -> Self {
        Self::Format {
            file: file.as_ref().to_path_buf(),
            cause: cause.into(),
        }
    }

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
