//! Ingestion error types

use std::path::PathBuf;
use thiserror::Error;

/// Fatal source errors. Per-record problems are `SourceParseError` instead.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Source file could not be opened
    #[error("cannot open record source '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
