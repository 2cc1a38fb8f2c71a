//! # Cache Errors

use thiserror::Error;

/// Failures from the page cache and the build cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Filesystem failure in the build cache directory.
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The manifest could not be serialized.
    #[error("cache manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// A page render failed and there was no cached copy to serve.
    #[error("render failed for {key}: {reason}")]
    Render { key: String, reason: String },
}
