//! Producer metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Message counters for one producer adapter
#[derive(Debug, Default)]
pub struct ProducerMetrics {
    /// Payloads accepted into the worker pool
    enqueued: AtomicU64,
    /// Payloads dropped by the content filter
    suppressed: AtomicU64,
    /// Payloads handed to the async producer
    forwarded: AtomicU64,
    /// Redelivery attempts
    retried: AtomicU64,
    /// Broker acknowledgements observed by the drain loop
    delivered: AtomicU64,
    /// Delivery failures observed by the drain loop
    failed: AtomicU64,
}

impl ProducerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_suppressed(&self) {
        self.suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_retried(&self) {
        self.retried.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProducerSnapshot {
        ProducerSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of producer metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerSnapshot {
    pub enqueued: u64,
    pub suppressed: u64,
    pub forwarded: u64,
    pub retried: u64,
    pub delivered: u64,
    pub failed: u64,
}

impl ProducerSnapshot {
    /// Messages neither suppressed nor settled yet
    pub fn pending(&self) -> u64 {
        self.enqueued
            .saturating_sub(self.suppressed)
            .saturating_sub(self.delivered)
            .saturating_sub(self.failed)
    }
}
