//! Error types for bittrex-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid market symbol: {0}")]
    InvalidSymbol(String),

    #[error("Invalid order book depth: {0} (expected 1, 25 or 500)")]
    InvalidDepth(u32),

    #[error("Invalid candle interval: {0}")]
    InvalidInterval(String),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
