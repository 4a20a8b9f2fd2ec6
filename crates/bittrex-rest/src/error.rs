//! REST client error types.

use bittrex_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("HTTP {status}: {code}")]
    Api { status: u16, code: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] CoreError),

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type RestResult<T> = Result<T, RestError>;
