//! Domain events shared by the push feeds and the REST collaborator.
//!
//! Field names follow the exchange's camelCase JSON so the same types decode
//! REST responses and single-delta push envelopes without adapters.

use crate::{CandleInterval, MarketSymbol, Quantity, Rate};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Best bid, best ask and last trade rate for one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub symbol: MarketSymbol,
    pub last_trade_rate: Rate,
    pub bid_rate: Rate,
    pub ask_rate: Rate,
}

/// Rolling 24-hour summary for one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub symbol: MarketSymbol,
    pub high: Rate,
    pub low: Rate,
    pub volume: Quantity,
    pub quote_volume: Decimal,
    /// Absent for markets without a reference price 24h ago.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_change: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

/// Side that took liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TakerSide {
    Buy,
    Sell,
}

/// One trade execution as transmitted on the wire (no market symbol).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDelta {
    pub id: String,
    pub executed_at: DateTime<Utc>,
    pub quantity: Quantity,
    pub rate: Rate,
    pub taker_side: TakerSide,
}

/// Trade execution stamped with its market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub symbol: MarketSymbol,
    pub id: String,
    pub executed_at: DateTime<Utc>,
    pub quantity: Quantity,
    pub rate: Rate,
    pub taker_side: TakerSide,
}

impl Trade {
    pub fn from_delta(symbol: MarketSymbol, delta: TradeDelta) -> Self {
        Self {
            symbol,
            id: delta.id,
            executed_at: delta.executed_at,
            quantity: delta.quantity,
            rate: delta.rate,
            taker_side: delta.taker_side,
        }
    }
}

/// OHLCV values of one candle as transmitted on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandleDelta {
    pub starts_at: DateTime<Utc>,
    pub open: Rate,
    pub high: Rate,
    pub low: Rate,
    pub close: Rate,
    pub volume: Quantity,
    pub quote_volume: Decimal,
}

/// Candle stamped with its market and interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    pub market_symbol: MarketSymbol,
    pub interval: CandleInterval,
    pub starts_at: DateTime<Utc>,
    pub open: Rate,
    pub high: Rate,
    pub low: Rate,
    pub close: Rate,
    pub volume: Quantity,
    pub quote_volume: Decimal,
}

impl Candle {
    pub fn from_delta(market_symbol: MarketSymbol, interval: CandleInterval, delta: CandleDelta) -> Self {
        Self {
            market_symbol,
            interval,
            starts_at: delta.starts_at,
            open: delta.open,
            high: delta.high,
            low: delta.low,
            close: delta.close,
            volume: delta.volume,
            quote_volume: delta.quote_volume,
        }
    }
}

/// One price level of an order book side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLevel {
    pub quantity: Quantity,
    pub rate: Rate,
}

/// Order book for one market.
///
/// Each pushed book replaces the previous one for the same symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    pub symbol: MarketSymbol,
    pub depth: u32,
    /// Exchange sequence number, 0 for REST snapshots.
    #[serde(default)]
    pub sequence: u64,
    #[serde(rename = "bid")]
    pub bids: Vec<OrderLevel>,
    #[serde(rename = "ask")]
    pub asks: Vec<OrderLevel>,
}

impl OrderBook {
    pub fn best_bid(&self) -> Option<&OrderLevel> {
        self.bids
            .iter()
            .filter(|level| !level.quantity.is_zero())
            .max_by(|a, b| a.rate.cmp(&b.rate))
    }

    pub fn best_ask(&self) -> Option<&OrderLevel> {
        self.asks
            .iter()
            .filter(|level| !level.quantity.is_zero())
            .min_by(|a, b| a.rate.cmp(&b.rate))
    }
}

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    Buy,
    Sell,
}

/// State of one of the account's orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOrder {
    pub id: String,
    pub market_symbol: MarketSymbol,
    pub direction: OrderDirection,
    #[serde(rename = "type")]
    pub order_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ceiling: Option<Decimal>,
    pub time_in_force: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
    pub fill_quantity: Quantity,
    pub commission: Decimal,
    pub proceeds: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl AccountOrder {
    pub fn is_closed(&self) -> bool {
        self.status.eq_ignore_ascii_case("CLOSED")
    }
}

/// Order change pushed on the private order stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub account_id: String,
    pub sequence: u64,
    pub order: AccountOrder,
}

/// Balance of one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub currency_symbol: String,
    pub total: Decimal,
    pub available: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Balance change pushed on the private balance stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceUpdate {
    pub account_id: String,
    pub sequence: u64,
    pub balance: Balance,
}

/// Event forwarded to stream consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketEvent {
    Ticker(Ticker),
    Trade(Trade),
    Candle(Candle),
    OrderBook(OrderBook),
    MarketSummary(MarketSummary),
    Order(OrderUpdate),
    Balance(BalanceUpdate),
}

impl MarketEvent {
    /// Market the event belongs to, `None` for balance events.
    pub fn symbol(&self) -> Option<&MarketSymbol> {
        match self {
            Self::Ticker(t) => Some(&t.symbol),
            Self::Trade(t) => Some(&t.symbol),
            Self::Candle(c) => Some(&c.market_symbol),
            Self::OrderBook(b) => Some(&b.symbol),
            Self::MarketSummary(s) => Some(&s.symbol),
            Self::Order(o) => Some(&o.order.market_symbol),
            Self::Balance(_) => None,
        }
    }

    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ticker(_) => "ticker",
            Self::Trade(_) => "trade",
            Self::Candle(_) => "candle",
            Self::OrderBook(_) => "orderbook",
            Self::MarketSummary(_) => "market_summary",
            Self::Order(_) => "order",
            Self::Balance(_) => "balance",
        }
    }
}
