//! Subscribable push feeds and their hub topic names.

use crate::error::{CoreError, Result};
use crate::MarketSymbol;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Candle granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CandleInterval {
    /// Shortest supported granularity.
    #[default]
    #[serde(rename = "MINUTE_1")]
    Minute1,
    #[serde(rename = "MINUTE_5")]
    Minute5,
    #[serde(rename = "HOUR_1")]
    Hour1,
    #[serde(rename = "DAY_1")]
    Day1,
}

impl CandleInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minute1 => "MINUTE_1",
            Self::Minute5 => "MINUTE_5",
            Self::Hour1 => "HOUR_1",
            Self::Day1 => "DAY_1",
        }
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandleInterval {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "MINUTE_1" => Ok(Self::Minute1),
            "MINUTE_5" => Ok(Self::Minute5),
            "HOUR_1" => Ok(Self::Hour1),
            "DAY_1" => Ok(Self::Day1),
            _ => Err(CoreError::InvalidInterval(s.to_string())),
        }
    }
}

/// Order book depth accepted by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderBookDepth {
    One,
    #[default]
    TwentyFive,
    FiveHundred,
}

impl OrderBookDepth {
    pub fn levels(&self) -> u32 {
        match self {
            Self::One => 1,
            Self::TwentyFive => 25,
            Self::FiveHundred => 500,
        }
    }
}

impl TryFrom<u32> for OrderBookDepth {
    type Error = CoreError;

    /// `0` selects the exchange default of 25 levels.
    fn try_from(levels: u32) -> Result<Self> {
        match levels {
            0 | 25 => Ok(Self::TwentyFive),
            1 => Ok(Self::One),
            500 => Ok(Self::FiveHundred),
            other => Err(CoreError::InvalidDepth(other)),
        }
    }
}

impl fmt::Display for OrderBookDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.levels())
    }
}

/// Kind of push stream, independent of market scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    Heartbeat,
    Ticker,
    Tickers,
    Trade,
    Candle,
    OrderBook,
    MarketSummary,
    MarketSummaries,
    Order,
    Balance,
}

impl FeedKind {
    /// Hub method name the server uses when pushing this stream.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Heartbeat => "heartbeat",
            Self::Ticker => "ticker",
            Self::Tickers => "tickers",
            Self::Trade => "trade",
            Self::Candle => "candle",
            Self::OrderBook => "orderBook",
            Self::MarketSummary => "marketSummary",
            Self::MarketSummaries => "marketSummaries",
            Self::Order => "order",
            Self::Balance => "balance",
        }
    }

    /// Resolve a pushed hub method name. Matching is case-insensitive.
    pub fn from_method(method: &str) -> Option<Self> {
        const ALL: [FeedKind; 10] = [
            FeedKind::Heartbeat,
            FeedKind::Ticker,
            FeedKind::Tickers,
            FeedKind::Trade,
            FeedKind::Candle,
            FeedKind::OrderBook,
            FeedKind::MarketSummary,
            FeedKind::MarketSummaries,
            FeedKind::Order,
            FeedKind::Balance,
        ];
        ALL.into_iter()
            .find(|kind| kind.method().eq_ignore_ascii_case(method))
    }

    /// Private streams require an authenticated connection.
    pub fn is_private(&self) -> bool {
        matches!(self, Self::Order | Self::Balance)
    }

    /// Connect timeout used when the configuration does not override it.
    ///
    /// High-volume ticker and trade streams get the longer budget.
    pub fn default_connect_timeout(&self) -> Duration {
        match self {
            Self::Ticker | Self::Tickers | Self::Trade | Self::Order | Self::Balance => {
                Duration::from_secs(15)
            }
            Self::Heartbeat
            | Self::Candle
            | Self::OrderBook
            | Self::MarketSummary
            | Self::MarketSummaries => Duration::from_secs(5),
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// A subscribable stream: kind plus market scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Feed {
    Heartbeat,
    Ticker(MarketSymbol),
    Tickers,
    Trade(MarketSymbol),
    Candle {
        symbol: MarketSymbol,
        interval: CandleInterval,
    },
    OrderBook {
        symbol: MarketSymbol,
        depth: OrderBookDepth,
    },
    MarketSummary(MarketSymbol),
    MarketSummaries,
    Order,
    Balance,
}

impl Feed {
    pub fn kind(&self) -> FeedKind {
        match self {
            Self::Heartbeat => FeedKind::Heartbeat,
            Self::Ticker(_) => FeedKind::Ticker,
            Self::Tickers => FeedKind::Tickers,
            Self::Trade(_) => FeedKind::Trade,
            Self::Candle { .. } => FeedKind::Candle,
            Self::OrderBook { .. } => FeedKind::OrderBook,
            Self::MarketSummary(_) => FeedKind::MarketSummary,
            Self::MarketSummaries => FeedKind::MarketSummaries,
            Self::Order => FeedKind::Order,
            Self::Balance => FeedKind::Balance,
        }
    }

    /// Market scope, `None` for all-market and account feeds.
    pub fn symbol(&self) -> Option<&MarketSymbol> {
        match self {
            Self::Ticker(symbol)
            | Self::Trade(symbol)
            | Self::MarketSummary(symbol)
            | Self::Candle { symbol, .. }
            | Self::OrderBook { symbol, .. } => Some(symbol),
            Self::Heartbeat
            | Self::Tickers
            | Self::MarketSummaries
            | Self::Order
            | Self::Balance => None,
        }
    }

    pub fn is_private(&self) -> bool {
        self.kind().is_private()
    }

    /// Hub subscription topic for this feed.
    pub fn topic(&self) -> String {
        match self {
            Self::Heartbeat => "heartbeat".to_string(),
            Self::Ticker(symbol) => format!("ticker_{symbol}"),
            Self::Tickers => "tickers".to_string(),
            Self::Trade(symbol) => format!("trade_{symbol}"),
            Self::Candle { symbol, interval } => format!("candle_{symbol}_{interval}"),
            Self::OrderBook { symbol, depth } => format!("orderbook_{symbol}_{depth}"),
            Self::MarketSummary(symbol) => format!("market_summary_{symbol}"),
            Self::MarketSummaries => "market_summaries".to_string(),
            Self::Order => "order".to_string(),
            Self::Balance => "balance".to_string(),
        }
    }

    /// Parse a feed from its topic string (e.g. `"orderbook_BTC-USD_25"`).
    pub fn from_topic(topic: &str) -> Result<Self> {
        let topic = topic.trim();
        let invalid = || CoreError::InvalidSymbol(topic.to_string());

        match topic {
            "heartbeat" => return Ok(Self::Heartbeat),
            "tickers" => return Ok(Self::Tickers),
            "market_summaries" => return Ok(Self::MarketSummaries),
            "order" => return Ok(Self::Order),
            "balance" => return Ok(Self::Balance),
            _ => {}
        }

        if let Some(rest) = topic.strip_prefix("market_summary_") {
            return Ok(Self::MarketSummary(MarketSymbol::parse(rest)?));
        }
        if let Some(rest) = topic.strip_prefix("ticker_") {
            return Ok(Self::Ticker(MarketSymbol::parse(rest)?));
        }
        if let Some(rest) = topic.strip_prefix("trade_") {
            return Ok(Self::Trade(MarketSymbol::parse(rest)?));
        }
        if let Some(rest) = topic.strip_prefix("orderbook_") {
            let (symbol, depth) = rest.rsplit_once('_').ok_or_else(invalid)?;
            let levels: u32 = depth.parse().map_err(|_| invalid())?;
            return Ok(Self::OrderBook {
                symbol: MarketSymbol::parse(symbol)?,
                depth: OrderBookDepth::try_from(levels)?,
            });
        }
        if let Some(rest) = topic.strip_prefix("candle_") {
            // Interval names contain an underscore themselves: candle_BTC-USD_MINUTE_1
            let (symbol, interval) = rest.split_once('_').ok_or_else(invalid)?;
            return Ok(Self::Candle {
                symbol: MarketSymbol::parse(symbol)?,
                interval: interval.parse()?,
            });
        }

        Err(invalid())
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.topic())
    }
}

impl FromStr for Feed {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_topic(s)
    }
}
