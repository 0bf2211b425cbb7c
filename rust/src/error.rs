// Typed errors for caller mistakes. Platform load failures stay `anyhow::Error`
// and travel through the error handler instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreloadError {
    /// A lookup named a resource that is not part of the current batch.
    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
