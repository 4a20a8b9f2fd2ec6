//! Push payload codec.
//!
//! Each pushed argument is a quoted base64 string wrapping a raw DEFLATE
//! stream of JSON. The stream has no zlib header or checksum; inflating it
//! raw is equivalent to prefixing the `0x78 0x9C` zlib header and ignoring
//! the missing trailer.

use crate::envelope::Envelope;
use crate::error::DecodeError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bittrex_core::FeedKind;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::{Read, Write};

/// Decode one pushed argument for a stream of `kind`.
pub fn decode(kind: FeedKind, raw: &str) -> Result<Envelope, DecodeError> {
    let json = inflate(raw)?;
    parse(kind, &json)
}

/// Decode a pushed argument as it appears in the hub frame.
pub fn decode_arg(kind: FeedKind, arg: &Value) -> Result<Envelope, DecodeError> {
    match arg {
        Value::String(raw) => decode(kind, raw),
        other => Err(DecodeError::NotAString(other.to_string())),
    }
}

/// Base64-decode and inflate a payload into JSON bytes.
pub fn inflate(raw: &str) -> Result<Vec<u8>, DecodeError> {
    let compressed = BASE64.decode(raw.trim().trim_matches('"'))?;

    let mut json = Vec::with_capacity(compressed.len() * 4);
    DeflateDecoder::new(compressed.as_slice()).read_to_end(&mut json)?;

    if json.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(json)
}

/// Compress and base64-encode JSON the way the hub does. Used to build
/// fixtures and replay captured traffic.
pub fn encode(json: &[u8]) -> std::io::Result<String> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(json)?;
    Ok(BASE64.encode(encoder.finish()?))
}

fn parse(kind: FeedKind, json: &[u8]) -> Result<Envelope, DecodeError> {
    let envelope = match kind {
        FeedKind::Heartbeat => return Err(DecodeError::NoPayload { kind }),
        FeedKind::Ticker => Envelope::Ticker(from_json(kind, json)?),
        FeedKind::Tickers => Envelope::Tickers(from_json(kind, json)?),
        FeedKind::Trade => Envelope::Trade(from_json(kind, json)?),
        FeedKind::Candle => Envelope::Candle(from_json(kind, json)?),
        FeedKind::OrderBook => Envelope::OrderBook(from_json(kind, json)?),
        FeedKind::MarketSummary => Envelope::MarketSummary(from_json(kind, json)?),
        FeedKind::MarketSummaries => Envelope::MarketSummaries(from_json(kind, json)?),
        FeedKind::Order => Envelope::Order(from_json(kind, json)?),
        FeedKind::Balance => Envelope::Balance(from_json(kind, json)?),
    };
    Ok(envelope)
}

fn from_json<T: DeserializeOwned>(kind: FeedKind, json: &[u8]) -> Result<T, DecodeError> {
    serde_json::from_slice(json).map_err(|source| DecodeError::Json { kind, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bittrex_core::MarketEvent;
    use serde_json::json;

    fn wire(value: &Value) -> String {
        encode(value.to_string().as_bytes()).unwrap()
    }

    fn assert_round_trip(kind: FeedKind, value: Value) {
        let envelope = decode(kind, &wire(&value)).unwrap();
        assert_eq!(envelope.kind(), kind);
        assert_eq!(envelope.to_json().unwrap(), value);
    }

    #[test]
    fn test_round_trip_trade() {
        assert_round_trip(
            FeedKind::Trade,
            json!({
                "sequence": 12,
                "marketSymbol": "ETH-USD",
                "deltas": [
                    {"id": "t1", "executedAt": "2021-04-01T10:00:00.123Z", "quantity": "0.5", "rate": "2000.10", "takerSide": "BUY"},
                    {"id": "t2", "executedAt": "2021-04-01T10:00:01Z", "quantity": "1.25", "rate": "2000.00", "takerSide": "SELL"}
                ]
            }),
        );
    }

    #[test]
    fn test_round_trip_candle() {
        assert_round_trip(
            FeedKind::Candle,
            json!({
                "sequence": 3,
                "marketSymbol": "BTC-USD",
                "interval": "MINUTE_1",
                "delta": {
                    "startsAt": "2021-04-01T10:00:00Z",
                    "open": "58000.000", "high": "58100.000", "low": "57950.000", "close": "58050.000",
                    "volume": "1.50000000", "quoteVolume": "87075.00000000"
                }
            }),
        );
    }

    #[test]
    fn test_round_trip_order_book() {
        assert_round_trip(
            FeedKind::OrderBook,
            json!({
                "marketSymbol": "BTC-USD",
                "depth": 25,
                "sequence": 100,
                "bidDeltas": [{"quantity": "0.1", "rate": "57999.9"}],
                "askDeltas": [{"quantity": "0", "rate": "58001.0"}, {"quantity": "2.5", "rate": "58002.0"}]
            }),
        );
    }

    #[test]
    fn test_round_trip_summaries_and_tickers() {
        assert_round_trip(
            FeedKind::MarketSummaries,
            json!({
                "sequence": 5,
                "deltas": [{
                    "symbol": "ADA-USD", "high": "1.20", "low": "1.10", "volume": "1000",
                    "quoteVolume": "1150", "percentChange": "-2.5", "updatedAt": "2021-04-01T10:00:00Z"
                }]
            }),
        );
        assert_round_trip(
            FeedKind::Ticker,
            json!({"symbol": "ETH-BTC", "lastTradeRate": "0.03", "bidRate": "0.0299", "askRate": "0.0301"}),
        );
    }

    #[test]
    fn test_round_trip_balance() {
        assert_round_trip(
            FeedKind::Balance,
            json!({
                "accountId": "acc-1",
                "sequence": 8,
                "delta": {"currencySymbol": "BTC", "total": "1.5", "available": "1.0", "updatedAt": "2021-04-01T10:00:00Z"}
            }),
        );
    }

    #[test]
    fn test_quoted_payload_is_accepted() {
        let payload = wire(&json!({"sequence": 1, "deltas": []}));
        let quoted = format!("\"{payload}\"");

        let envelope = decode(FeedKind::Tickers, &quoted).unwrap();
        assert!(envelope.into_events().is_empty());
    }

    #[test]
    fn test_single_ticker_is_its_own_event() {
        let payload = wire(&json!({"symbol": "ETH-BTC", "lastTradeRate": "0.03", "bidRate": "0.0299", "askRate": "0.0301"}));
        let events = decode(FeedKind::Ticker, &payload).unwrap().into_events();

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], MarketEvent::Ticker(t) if t.symbol.as_str() == "ETH-BTC"));
    }

    #[test]
    fn test_invalid_base64() {
        assert!(matches!(
            decode(FeedKind::Trade, "not base64!!"),
            Err(DecodeError::Base64(_))
        ));
    }

    #[test]
    fn test_invalid_deflate_stream() {
        let garbage = BASE64.encode([0xFFu8, 0xFF, 0xFF, 0xFF]);
        assert!(matches!(
            decode(FeedKind::Trade, &garbage),
            Err(DecodeError::Inflate(_))
        ));
    }

    #[test]
    fn test_empty_inflation() {
        let empty = encode(b"").unwrap();
        assert!(matches!(decode(FeedKind::Trade, &empty), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_wrong_shape_reports_kind() {
        let payload = encode(b"{\"unexpected\":true}").unwrap();
        match decode(FeedKind::OrderBook, &payload) {
            Err(DecodeError::Json { kind, .. }) => assert_eq!(kind, FeedKind::OrderBook),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_heartbeat_has_no_payload() {
        let payload = encode(b"{}").unwrap();
        assert!(matches!(
            decode(FeedKind::Heartbeat, &payload),
            Err(DecodeError::NoPayload { .. })
        ));
    }

    #[test]
    fn test_non_string_arg() {
        assert!(matches!(
            decode_arg(FeedKind::Trade, &json!(42)),
            Err(DecodeError::NotAString(_))
        ));
    }
}
