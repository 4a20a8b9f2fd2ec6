//! Non-blocking event delivery.
//!
//! The session never waits on its consumer: an event that does not fit in
//! the channel is dropped and counted.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Result of offering one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Delivered,
    Dropped,
}

/// Bounded, drop-on-full producer side of an event channel.
#[derive(Debug)]
pub struct EventSink<E> {
    tx: mpsc::Sender<E>,
    dropped: AtomicU64,
}

impl<E> EventSink<E> {
    pub fn new(tx: mpsc::Sender<E>) -> Self {
        Self {
            tx,
            dropped: AtomicU64::new(0),
        }
    }

    /// Create a sink together with its receiver.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<E>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Hand an event to the consumer without waiting.
    pub fn offer(&self, event: E) -> Offer {
        match self.tx.try_send(event) {
            Ok(()) => Offer::Delivered,
            Err(mpsc::error::TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(dropped, capacity = self.tx.max_capacity(), "Consumer is full, dropping event");
                Offer::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(dropped, "Consumer is gone, dropping event");
                Offer::Dropped
            }
        }
    }

    /// Events dropped since the sink was created.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
