pub mod cache;
pub mod http;
pub mod submission;

pub use cache::{CacheConfig, CacheError, LedgerCache, SingleFlight};
pub use http::{HttpLedger, RetryPolicy};
pub use submission::{build_submission, UnsignedBundle};

use thiserror::Error;

/// Maximum operations accepted in one unsigned bundle.
pub const MAX_BUNDLE_OPERATIONS: usize = 16;

/// Error type for client operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("failed: {0}")]
    Failed(reqwest::StatusCode),
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid URL scheme: {0} (expected http or https)")]
    InvalidScheme(String),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty operation list")]
    EmptySubmission,
    #[error("too many operations in one submission: {got} (max {max})")]
    TooManyOperations { max: usize, got: usize },
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
