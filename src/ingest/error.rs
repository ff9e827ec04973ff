use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for record loading failures.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("input path does not exist: {}", .0.display())]
    NotFound(PathBuf),
    #[error("no record files (.json, .jsonl, .ndjson) found under {}", .0.display())]
    NoInput(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON in {} at line {line}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error(
        "{} must contain an array of records or an object with a `records` or `data` array",
        .0.display()
    )]
    UnsupportedShape(PathBuf),
}
