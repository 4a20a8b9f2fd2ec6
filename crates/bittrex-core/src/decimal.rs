//! Exact decimal rates and quantities.
//!
//! Bittrex sends every rate and quantity as a decimal string, e.g.
//! `"0.00000001"`. Both newtypes keep the string form on the wire and a
//! `rust_decimal::Decimal` in memory.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Price of one unit of the base currency, in the quote currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(Decimal);

/// Amount of the base currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

macro_rules! decimal_newtype {
    ($name:ident) => {
        impl $name {
            pub fn new(value: Decimal) -> Self {
                Self(value)
            }

            pub fn inner(&self) -> Decimal {
                self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0.is_zero()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = rust_decimal::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

decimal_newtype!(Rate);
decimal_newtype!(Quantity);
