//! Bittrex v3 stream client.
//!
//! Main application that orchestrates all components:
//! - TOML configuration of feed sessions
//! - REST preflight against the market listing
//! - Hub sessions feeding one shared consumer

pub mod app;
pub mod config;
pub mod error;

pub use app::{Application, RunSummary};
pub use config::{AppConfig, RestConfig, SessionConfig};
pub use error::{AppError, AppResult};
