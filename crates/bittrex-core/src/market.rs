//! Market and currency identification types.

use crate::error::{CoreError, Result};
use crate::Quantity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Market symbol in `BASE-QUOTE` form (e.g. "ETH-USD").
///
/// Symbols built through [`MarketSymbol::parse`] are validated and
/// upper-cased; symbols deserialized from the exchange are taken verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketSymbol(String);

impl MarketSymbol {
    /// Parse and normalize a user supplied symbol.
    pub fn parse(raw: &str) -> Result<Self> {
        let symbol = raw.trim().to_uppercase();
        let mut parts = symbol.split('-');

        let valid = match (parts.next(), parts.next(), parts.next()) {
            (Some(base), Some(quote), None) => is_currency_code(base) && is_currency_code(quote),
            _ => false,
        };

        if !valid {
            return Err(CoreError::InvalidSymbol(raw.to_string()));
        }
        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base currency (left of the dash).
    pub fn base(&self) -> &str {
        self.0.split('-').next().unwrap_or_default()
    }

    /// Quote currency (right of the dash).
    pub fn quote(&self) -> &str {
        self.0.split('-').nth(1).unwrap_or_default()
    }
}

fn is_currency_code(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric())
}

impl fmt::Display for MarketSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MarketSymbol {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for MarketSymbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Currency listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub symbol: String,
    pub name: String,
    pub coin_type: String,
    pub status: String,
    #[serde(default)]
    pub min_confirmations: u32,
    #[serde(default)]
    pub notice: String,
    #[serde(default)]
    pub tx_fee: Option<rust_decimal::Decimal>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub prohibited_in: Vec<String>,
    #[serde(default)]
    pub base_address: Option<String>,
    #[serde(default)]
    pub associated_terms_of_service: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Market listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub symbol: MarketSymbol,
    pub base_currency_symbol: String,
    pub quote_currency_symbol: String,
    pub min_trade_size: Quantity,
    pub precision: u32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub notice: Option<String>,
    #[serde(default)]
    pub prohibited_in: Vec<String>,
    #[serde(default)]
    pub associated_terms_of_service: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Market {
    /// Whether the market currently accepts orders.
    pub fn is_online(&self) -> bool {
        self.status.eq_ignore_ascii_case("ONLINE")
    }
}
