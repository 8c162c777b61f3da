//! Error types for the forecast ETL pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using EtlError.
pub type EtlResult<T> = Result<T, EtlError>;

/// Primary error type for pipeline operations.
///
/// A fetch failure aborts the whole run. Store and export failures only abort
/// their own sink; the pipeline reports them in its run summary instead of
/// propagating them.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Forecast fetch failed: {0}")]
    FetchFailed(#[from] FetchError),

    #[error("Forecast payload contained no records")]
    EmptyPayload,

    #[error("Store write failed: {0}")]
    StoreWriteFailed(#[from] sqlx::Error),

    #[error("Export write failed for '{}': {source}", .path.display())]
    ExportWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Everything that can go wrong while retrieving the feed.
///
/// All variants collapse into [`EtlError::FetchFailed`] at the pipeline boundary.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("feed returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed feed body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// HTTP status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_timeout())
    }
}
