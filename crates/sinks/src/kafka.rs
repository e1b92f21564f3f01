//! KafkaSink - `io::Write` facade over the shared producer adapter

use std::io::{self, Write};
use std::sync::Arc;

use broker::{BrokerError, ProducerAdapter, TopicBinding};
use bytes::Bytes;
use tracing::debug;

/// Writer that forwards every buffer to one topic binding
///
/// Without a producer handle every write is a successful no-op, so a stream
/// can always be wired with a `KafkaSink` whether forwarding is enabled or not.
#[derive(Clone)]
pub struct KafkaSink {
    producer: Option<Arc<ProducerAdapter>>,
    binding: TopicBinding,
}

impl KafkaSink {
    pub fn new(producer: Option<Arc<ProducerAdapter>>, binding: TopicBinding) -> Self {
        Self { producer, binding }
    }

    /// Sink with forwarding disabled
    pub fn disabled(binding: TopicBinding) -> Self {
        Self::new(None, binding)
    }

    pub fn binding(&self) -> &TopicBinding {
        &self.binding
    }

    pub fn is_enabled(&self) -> bool {
        self.producer.is_some()
    }
}

impl Write for KafkaSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let Some(producer) = &self.producer else {
            return Ok(buf.len());
        };

        match producer.send_filtered(&self.binding, Bytes::copy_from_slice(buf)) {
            Ok(()) => Ok(buf.len()),
            Err(BrokerError::EmptyPayload) => Ok(0),
            Err(e @ (BrokerError::NotInitialized | BrokerError::Pool(_))) => {
                debug!(topic = self.binding.topic(), error = %e, "Kafka sink rejected write");
                Err(io::Error::new(io::ErrorKind::BrokenPipe, e))
            }
            Err(e) => Err(io::Error::other(e)),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for KafkaSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaSink")
            .field("topic", &self.binding.topic())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker::mock::MockTransport;
    use broker::{ContentFilter, ProducerSettings};
    use contracts::PoolSettings;
    use std::time::Duration;

    fn adapter(transport: Arc<MockTransport>) -> Arc<ProducerAdapter> {
        let settings = PoolSettings {
            name: "sink-test-pool".to_string(),
            worker_count: 2,
            queue_capacity: 100,
            idle_timeout: Duration::from_secs(4),
        };
        Arc::new(ProducerAdapter::init(transport, settings, ProducerSettings::default()).unwrap())
    }

    #[test]
    fn test_disabled_sink_is_a_noop() {
        // No runtime here: a disabled sink must not need one
        let mut sink = KafkaSink::disabled(TopicBinding::unfiltered("errors"));
        assert!(!sink.is_enabled());
        let line = br#"{"msg":"x"}"#;
        assert_eq!(sink.write(line).unwrap(), line.len());
        assert_eq!(sink.write(b"").unwrap(), 0);
        sink.flush().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_write_forwards_through_binding() {
        let transport = Arc::new(MockTransport::new());
        let producer = adapter(Arc::clone(&transport));
        let binding = TopicBinding::new("errors", ContentFilter::new(["heartbeat"]));
        let mut sink = KafkaSink::new(Some(Arc::clone(&producer)), binding);

        let line = br#"{"level":"error","msg":"disk full"}"#;
        assert_eq!(sink.write(line).unwrap(), line.len());
        assert_eq!(sink.write(br#"{"msg":"heartbeat"}"#).unwrap(), 19);
        sink.flush().unwrap();
        producer.shutdown().await;

        assert_eq!(transport.delivered_to("errors"), vec![Bytes::from_static(line)]);
    }

    #[tokio::test]
    async fn test_empty_write_accepts_nothing() {
        let producer = adapter(Arc::new(MockTransport::new()));
        let mut sink = KafkaSink::new(Some(Arc::clone(&producer)), TopicBinding::unfiltered("t"));
        assert_eq!(sink.write(b"").unwrap(), 0);
        producer.shutdown().await;
    }

    #[tokio::test]
    async fn test_write_after_shutdown_is_broken_pipe() {
        let producer = adapter(Arc::new(MockTransport::new()));
        producer.shutdown().await;

        let mut sink = KafkaSink::new(Some(producer), TopicBinding::unfiltered("t"));
        let err = sink.write(b"late").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
