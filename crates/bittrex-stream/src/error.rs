//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid feed: {0}")]
    Feed(#[from] bittrex_core::CoreError),

    #[error("REST error: {0}")]
    Rest(#[from] bittrex_rest::RestError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] bittrex_telemetry::TelemetryError),

    #[error("Preflight error: {0}")]
    Preflight(String),

    #[error("Session task failed: {0}")]
    Session(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
