//! Prometheus metrics for the stream client.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, register_int_gauge, IntCounterVec, IntGauge};

/// Events handed to the consumer.
/// Labels: kind (ticker/trade/candle/orderbook/market_summary/order/balance)
pub static EVENTS_FORWARDED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "bittrex_events_forwarded_total",
        "Events forwarded to the consumer",
        &["kind"]
    )
    .unwrap()
});

/// Events dropped because the consumer channel was full.
pub static EVENTS_DROPPED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "bittrex_events_dropped_total",
        "Events dropped on a full consumer channel",
        &["session"]
    )
    .unwrap()
});

/// Push payloads that failed to decode.
pub static DECODE_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "bittrex_decode_errors_total",
        "Push payloads that failed to decode",
        &["session"]
    )
    .unwrap()
});

/// Session terminations by reason.
pub static SESSION_TERMINATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "bittrex_session_terminations_total",
        "Session terminations by reason",
        &["session", "reason"]
    )
    .unwrap()
});

/// Sessions currently running.
pub static SESSIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("bittrex_sessions_active", "Sessions currently running").unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record one event delivered to the consumer.
    pub fn event_forwarded(kind: &str) {
        EVENTS_FORWARDED_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record a started session.
    pub fn session_started() {
        SESSIONS_ACTIVE.inc();
    }

    /// Record a finished session with its final counters.
    pub fn session_finished(session: &str, reason: &str, dropped: u64, decode_errors: u64) {
        SESSIONS_ACTIVE.dec();
        SESSION_TERMINATIONS_TOTAL
            .with_label_values(&[session, reason])
            .inc();
        EVENTS_DROPPED_TOTAL
            .with_label_values(&[session])
            .inc_by(dropped);
        DECODE_ERRORS_TOTAL
            .with_label_values(&[session])
            .inc_by(decode_errors);
    }
}
