//! Typed access to the public market data endpoints.

use crate::error::{RestError, RestResult};
use crate::fetch::{Fetch, HttpFetcher};
use bittrex_core::{
    Candle, CandleDelta, CandleInterval, Currency, Market, MarketSummary, MarketSymbol, OrderBook,
    OrderBookDepth, OrderLevel, Ticker, Trade, TradeDelta,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info};

/// Price source of a candle series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandleType {
    #[default]
    Trade,
    Midpoint,
}

impl CandleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trade => "TRADE",
            Self::Midpoint => "MIDPOINT",
        }
    }
}

impl fmt::Display for CandleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct OrderBookBody {
    #[serde(default)]
    bid: Vec<OrderLevel>,
    #[serde(default)]
    ask: Vec<OrderLevel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PingBody {
    server_time: i64,
}

/// Client for the public v3 market data endpoints.
pub struct MarketDataClient<F = HttpFetcher> {
    fetcher: F,
}

impl MarketDataClient<HttpFetcher> {
    /// Client against the production API.
    pub fn production() -> RestResult<Self> {
        Ok(Self::new(HttpFetcher::new()?))
    }
}

impl<F: Fetch> MarketDataClient<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> RestResult<T> {
        let body = self.fetcher.fetch(path).await?;
        serde_json::from_slice(&body).map_err(|source| RestError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub async fn currencies(&self) -> RestResult<Vec<Currency>> {
        self.get("currencies").await
    }

    pub async fn currency(&self, symbol: &str) -> RestResult<Currency> {
        self.get(&format!("currencies/{}", symbol.trim().to_uppercase()))
            .await
    }

    pub async fn markets(&self) -> RestResult<Vec<Market>> {
        let markets: Vec<Market> = self.get("markets").await?;
        info!(count = markets.len(), "Fetched markets");
        Ok(markets)
    }

    pub async fn market(&self, symbol: &MarketSymbol) -> RestResult<Market> {
        self.get(&format!("markets/{symbol}")).await
    }

    pub async fn market_summaries(&self) -> RestResult<Vec<MarketSummary>> {
        self.get("markets/summaries").await
    }

    pub async fn market_summary(&self, symbol: &MarketSymbol) -> RestResult<MarketSummary> {
        self.get(&format!("markets/{symbol}/summary")).await
    }

    pub async fn tickers(&self) -> RestResult<Vec<Ticker>> {
        self.get("markets/tickers").await
    }

    pub async fn ticker(&self, symbol: &MarketSymbol) -> RestResult<Ticker> {
        self.get(&format!("markets/{symbol}/ticker")).await
    }

    /// Order book snapshot. `depth` must be 1, 25 or 500; 0 means 25.
    pub async fn order_book(&self, symbol: &MarketSymbol, depth: u32) -> RestResult<OrderBook> {
        let depth = OrderBookDepth::try_from(depth)?;
        let body: OrderBookBody = self
            .get(&format!("markets/{symbol}/orderbook?depth={}", depth.levels()))
            .await?;

        debug!(%symbol, bids = body.bid.len(), asks = body.ask.len(), "Fetched order book");
        Ok(OrderBook {
            symbol: symbol.clone(),
            depth: depth.levels(),
            sequence: 0,
            bids: body.bid,
            asks: body.ask,
        })
    }

    /// Recent trades, stamped with their market.
    pub async fn trades(&self, symbol: &MarketSymbol) -> RestResult<Vec<Trade>> {
        let deltas: Vec<TradeDelta> = self.get(&format!("markets/{symbol}/trades")).await?;
        Ok(deltas
            .into_iter()
            .map(|delta| Trade::from_delta(symbol.clone(), delta))
            .collect())
    }

    /// Recent candles. Intervals without trading repeat the previous close
    /// with zero volume.
    pub async fn recent_candles(
        &self,
        symbol: &MarketSymbol,
        interval: CandleInterval,
        candle_type: CandleType,
    ) -> RestResult<Vec<Candle>> {
        let path = match candle_type {
            CandleType::Trade => format!("markets/{symbol}/candles/{interval}/recent"),
            other => format!("markets/{symbol}/candles/{other}/{interval}/recent"),
        };
        let deltas: Vec<CandleDelta> = self.get(&path).await?;
        Ok(deltas
            .into_iter()
            .map(|delta| Candle::from_delta(symbol.clone(), interval, delta))
            .collect())
    }

    /// Server time.
    pub async fn ping(&self) -> RestResult<DateTime<Utc>> {
        let body: PingBody = self.get("ping").await?;
        DateTime::from_timestamp_millis(body.server_time).ok_or_else(|| {
            RestError::HttpClient(format!("server time out of range: {}", body.server_time))
        })
    }
}
