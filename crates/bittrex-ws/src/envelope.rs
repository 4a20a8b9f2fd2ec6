//! Decoded push payloads and their expansion into events.
//!
//! Multi-delta envelopes expand into one event per delta, in delta order.
//! Single-market ticker and summary pushes are the event itself.

use bittrex_core::{
    AccountOrder, Balance, BalanceUpdate, Candle, CandleDelta, CandleInterval, FeedKind,
    MarketEvent, MarketSummary, MarketSymbol, OrderBook, OrderLevel, OrderUpdate, Ticker, Trade,
    TradeDelta,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerDeltas {
    pub sequence: u64,
    pub deltas: Vec<Ticker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummaryDeltas {
    pub sequence: u64,
    pub deltas: Vec<MarketSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDeltas {
    pub sequence: u64,
    pub market_symbol: MarketSymbol,
    pub deltas: Vec<TradeDelta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandlePush {
    pub sequence: u64,
    pub market_symbol: MarketSymbol,
    pub interval: CandleInterval,
    pub delta: CandleDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookDeltas {
    pub market_symbol: MarketSymbol,
    pub depth: u32,
    pub sequence: u64,
    pub bid_deltas: Vec<OrderLevel>,
    pub ask_deltas: Vec<OrderLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPush {
    pub account_id: String,
    pub sequence: u64,
    pub delta: AccountOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancePush {
    pub account_id: String,
    pub sequence: u64,
    pub delta: Balance,
}

/// One decoded push payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Ticker(Ticker),
    Tickers(TickerDeltas),
    Trade(TradeDeltas),
    Candle(CandlePush),
    OrderBook(OrderBookDeltas),
    MarketSummary(MarketSummary),
    MarketSummaries(MarketSummaryDeltas),
    Order(OrderPush),
    Balance(BalancePush),
}

impl Envelope {
    pub fn kind(&self) -> FeedKind {
        match self {
            Self::Ticker(_) => FeedKind::Ticker,
            Self::Tickers(_) => FeedKind::Tickers,
            Self::Trade(_) => FeedKind::Trade,
            Self::Candle(_) => FeedKind::Candle,
            Self::OrderBook(_) => FeedKind::OrderBook,
            Self::MarketSummary(_) => FeedKind::MarketSummary,
            Self::MarketSummaries(_) => FeedKind::MarketSummaries,
            Self::Order(_) => FeedKind::Order,
            Self::Balance(_) => FeedKind::Balance,
        }
    }

    /// Exchange sequence number, `None` for single-market envelopes that
    /// carry none.
    pub fn sequence(&self) -> Option<u64> {
        match self {
            Self::Ticker(_) | Self::MarketSummary(_) => None,
            Self::Tickers(e) => Some(e.sequence),
            Self::Trade(e) => Some(e.sequence),
            Self::Candle(e) => Some(e.sequence),
            Self::OrderBook(e) => Some(e.sequence),
            Self::MarketSummaries(e) => Some(e.sequence),
            Self::Order(e) => Some(e.sequence),
            Self::Balance(e) => Some(e.sequence),
        }
    }

    /// Expand into consumer events, preserving delta order.
    pub fn into_events(self) -> Vec<MarketEvent> {
        match self {
            Self::Ticker(ticker) => vec![MarketEvent::Ticker(ticker)],
            Self::Tickers(e) => e.deltas.into_iter().map(MarketEvent::Ticker).collect(),
            Self::Trade(e) => {
                let symbol = e.market_symbol;
                e.deltas
                    .into_iter()
                    .map(|delta| MarketEvent::Trade(Trade::from_delta(symbol.clone(), delta)))
                    .collect()
            }
            Self::Candle(e) => vec![MarketEvent::Candle(Candle::from_delta(
                e.market_symbol,
                e.interval,
                e.delta,
            ))],
            Self::OrderBook(e) => vec![MarketEvent::OrderBook(OrderBook {
                symbol: e.market_symbol,
                depth: e.depth,
                sequence: e.sequence,
                bids: e.bid_deltas,
                asks: e.ask_deltas,
            })],
            Self::MarketSummary(summary) => vec![MarketEvent::MarketSummary(summary)],
            Self::MarketSummaries(e) => e
                .deltas
                .into_iter()
                .map(MarketEvent::MarketSummary)
                .collect(),
            Self::Order(e) => vec![MarketEvent::Order(OrderUpdate {
                account_id: e.account_id,
                sequence: e.sequence,
                order: e.delta,
            })],
            Self::Balance(e) => vec![MarketEvent::Balance(BalanceUpdate {
                account_id: e.account_id,
                sequence: e.sequence,
                balance: e.delta,
            })],
        }
    }

    /// Wire JSON of the envelope.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        match self {
            Self::Ticker(e) => serde_json::to_value(e),
            Self::Tickers(e) => serde_json::to_value(e),
            Self::Trade(e) => serde_json::to_value(e),
            Self::Candle(e) => serde_json::to_value(e),
            Self::OrderBook(e) => serde_json::to_value(e),
            Self::MarketSummary(e) => serde_json::to_value(e),
            Self::MarketSummaries(e) => serde_json::to_value(e),
            Self::Order(e) => serde_json::to_value(e),
            Self::Balance(e) => serde_json::to_value(e),
        }
    }
}
