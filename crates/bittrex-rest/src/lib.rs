//! Public market data REST client for the Bittrex v3 API.
//!
//! Complements the push feeds with snapshots: market listings, summaries,
//! tickers, order books, recent trades and candles.

pub mod client;
pub mod error;
pub mod fetch;

pub use client::{CandleType, MarketDataClient};
pub use error::{RestError, RestResult};
pub use fetch::{Fetch, HttpFetcher, DEFAULT_BASE_URL};
