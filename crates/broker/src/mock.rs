//! MockTransport - in-memory transport for tests and dry runs

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use contracts::{BrokerTransport, ContractError};

/// Records every delivered message instead of talking to a broker
#[derive(Debug, Default)]
pub struct MockTransport {
    delivered: Mutex<Vec<(String, Bytes)>>,
    attempts: AtomicU64,
    fail_first: AtomicU32,
    failing_topics: HashSet<String>,
    hanging_topics: HashSet<String>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every delivery for `delay` before acknowledging
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Reject every delivery to `topic`
    pub fn failing_topic(mut self, topic: impl Into<String>) -> Self {
        self.failing_topics.insert(topic.into());
        self
    }

    /// Never complete a delivery to `topic`
    pub fn hanging_topic(mut self, topic: impl Into<String>) -> Self {
        self.hanging_topics.insert(topic.into());
        self
    }

    /// Reject the first `n` delivery attempts, whatever the topic
    pub fn failing_first(self, n: u32) -> Self {
        self.fail_first.store(n, Ordering::Relaxed);
        self
    }

    /// Delivered `(topic, payload)` pairs in acknowledgement order
    pub fn delivered(&self) -> Vec<(String, Bytes)> {
        match self.delivered.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn delivered_count(&self) -> usize {
        match self.delivered.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Payloads delivered to one topic
    pub fn delivered_to(&self, topic: &str) -> Vec<Bytes> {
        self.delivered()
            .into_iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| payload)
            .collect()
    }

    /// Delivery attempts, failed ones included
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Highest number of deliveries observed in progress at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }

    fn take_injected_failure(&self) -> bool {
        self.fail_first
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl BrokerTransport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn deliver(&self, topic: &str, payload: &Bytes) -> Result<(), ContractError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if self.hanging_topics.contains(topic) {
            return std::future::pending().await;
        }
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::Relaxed);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = if self.take_injected_failure() {
            Err(ContractError::broker_delivery(topic, "injected failure"))
        } else if self.failing_topics.contains(topic) {
            Err(ContractError::broker_delivery(topic, "topic unavailable"))
        } else {
            let mut delivered = match self.delivered.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            delivered.push((topic.to_string(), payload.clone()));
            Ok(())
        };

        self.in_flight.fetch_sub(1, Ordering::AcqRel);
        result
    }
}
