//! Push payload builders.

use bittrex_ws::decode::encode;
use bittrex_ws::HubPush;
use serde_json::{json, Value};

pub const HUB: &str = "C3";

pub fn payload(value: &Value) -> Value {
    Value::String(encode(value.to_string().as_bytes()).unwrap())
}

pub fn push(method: &str, args: Vec<Value>) -> HubPush {
    HubPush::new(HUB, method, args)
}

pub fn heartbeat() -> HubPush {
    push("heartbeat", vec![])
}

pub fn trade_envelope(symbol: &str, ids: &[&str]) -> Value {
    let deltas: Vec<Value> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            json!({
                "id": id,
                "executedAt": "2021-04-01T10:00:00Z",
                "quantity": format!("{}.5", i + 1),
                "rate": "2000.00",
                "takerSide": if i % 2 == 0 { "BUY" } else { "SELL" },
            })
        })
        .collect();

    json!({
        "sequence": 42,
        "marketSymbol": symbol,
        "deltas": deltas,
    })
}

pub fn trade_push(symbol: &str, ids: &[&str]) -> HubPush {
    push("trade", vec![payload(&trade_envelope(symbol, ids))])
}

pub fn order_book_push(symbol: &str) -> HubPush {
    let envelope = json!({
        "marketSymbol": symbol,
        "depth": 25,
        "sequence": 7,
        "bidDeltas": [{"quantity": "1.0", "rate": "99.5"}],
        "askDeltas": [{"quantity": "2.0", "rate": "100.5"}],
    });
    push("orderBook", vec![payload(&envelope)])
}

pub fn balance_push(currency: &str) -> HubPush {
    let envelope = json!({
        "accountId": "acc-1",
        "sequence": 3,
        "delta": {
            "currencySymbol": currency,
            "total": "1.5",
            "available": "1.0",
            "updatedAt": "2021-04-01T10:00:00Z",
        },
    });
    push("balance", vec![payload(&envelope)])
}
