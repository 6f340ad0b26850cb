use std::path::PathBuf;

use thiserror::Error;

use crate::symbols::SymbolError;

/// Run-level failures. Anything per-map is handled as a counted skip in the
/// synchronizers and never surfaces here.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("missing required input: {0}")]
    MissingInput(PathBuf),
    #[error(transparent)]
    Symbols(#[from] SymbolError),
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
