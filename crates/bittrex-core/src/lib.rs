//! Core domain types for the Bittrex v3 streaming client.
//!
//! This crate provides the types shared by the push feeds and the REST
//! collaborator:
//! - `Rate`, `Quantity`: precision-safe decimal wrappers
//! - `MarketSymbol`, `Market`, `Currency`: market identification
//! - `Feed`, `FeedKind`: subscribable streams and their topic names
//! - `MarketEvent` and the per-feed event types

pub mod decimal;
pub mod error;
pub mod feed;
pub mod market;
pub mod types;

pub use decimal::{Quantity, Rate};
pub use error::{CoreError, Result};
pub use feed::{CandleInterval, Feed, FeedKind, OrderBookDepth};
pub use market::{Currency, Market, MarketSymbol};
pub use types::{
    AccountOrder, Balance, BalanceUpdate, Candle, CandleDelta, MarketEvent, MarketSummary,
    OrderBook, OrderDirection, OrderLevel, OrderUpdate, TakerSide, Ticker, Trade, TradeDelta,
};
