//! Producer message types

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use contracts::ContractError;

/// One record on its way to the broker
#[derive(Debug, Clone)]
pub struct ProducerMessage {
    /// Destination topic
    pub topic: Arc<str>,
    /// Encoded log record, sent as the record value
    pub value: Bytes,
    enqueued_at: Instant,
}

impl ProducerMessage {
    pub fn new(topic: impl Into<Arc<str>>, value: Bytes) -> Self {
        Self {
            topic: topic.into(),
            value,
            enqueued_at: Instant::now(),
        }
    }

    /// Time since the message was handed to the adapter
    pub fn age(&self) -> Duration {
        self.enqueued_at.elapsed()
    }
}

/// A message the producer gave up on
#[derive(Debug)]
pub struct ProducerError {
    pub message: ProducerMessage,
    pub error: ContractError,
    /// Delivery attempts made, including the first
    pub attempts: u32,
}

impl std::fmt::Display for ProducerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (topic '{}', {} attempts)",
            self.error, self.message.topic, self.attempts
        )
    }
}
