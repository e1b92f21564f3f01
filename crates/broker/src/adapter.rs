//! ProducerAdapter - the process-wide entry point to the broker
//!
//! One adapter per process, shared by every topic binding through `Arc`.
//! `send` never waits for the broker: it only enqueues a task on the worker
//! pool, and the task forwards the message into the async producer.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use contracts::{BrokerTransport, PoolSettings};
use dispatcher::{PoolSnapshot, WorkerPool};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::drain::spawn_drain_loop;
use crate::error::BrokerError;
use crate::filter::{ContentFilter, TopicBinding};
use crate::message::ProducerMessage;
use crate::metrics::{ProducerMetrics, ProducerSnapshot};
use crate::producer::{AsyncProducer, ProducerSettings};

/// Background loops owned by the adapter
struct Background {
    producer: AsyncProducer,
    drain: JoinHandle<()>,
}

pub struct ProducerAdapter {
    transport: String,
    pool: WorkerPool,
    input: async_channel::Sender<ProducerMessage>,
    metrics: Arc<ProducerMetrics>,
    background: Mutex<Option<Background>>,
}

impl ProducerAdapter {
    /// Connect to Kafka and start the adapter
    ///
    /// # Errors
    /// - Malformed `worker_pool` section
    /// - Broker unreachable
    #[cfg(feature = "kafka")]
    pub async fn connect(config: &contracts::KafkaClientConfig) -> Result<Self, BrokerError> {
        let pool_settings = PoolSettings::from_config(config.worker_pool.as_ref())?;
        let transport = crate::kafka::KafkaTransport::connect(&config.hosts)
            .await
            .map_err(BrokerError::Connection)?;
        Self::init(Arc::new(transport), pool_settings, ProducerSettings::default())
    }

    /// Start the worker pool, the async producer and the drain loop
    ///
    /// Must be called inside a Tokio runtime.
    #[instrument(
        name = "producer_adapter_init",
        skip_all,
        fields(transport = %transport.name(), pool = %pool_settings.name)
    )]
    pub fn init<T>(
        transport: Arc<T>,
        pool_settings: PoolSettings,
        settings: ProducerSettings,
    ) -> Result<Self, BrokerError>
    where
        T: BrokerTransport + Sync + 'static,
    {
        let pool = WorkerPool::start(pool_settings)?;
        let metrics = Arc::new(ProducerMetrics::new());
        let name = transport.name().to_string();

        let (producer, notifications) =
            AsyncProducer::spawn(transport, settings, Arc::clone(&metrics));
        let drain = spawn_drain_loop(notifications, Arc::clone(&metrics));
        let input = producer.input().clone();

        info!("Producer adapter started");
        Ok(Self {
            transport: name,
            pool,
            input,
            metrics,
            background: Mutex::new(Some(Background { producer, drain })),
        })
    }

    /// Name of the underlying transport
    pub fn transport_name(&self) -> &str {
        &self.transport
    }

    /// Enqueue `payload` for `topic`, unfiltered
    ///
    /// Blocks only while the dispatch queue is full.
    pub fn send(&self, topic: &str, payload: Bytes) -> Result<(), BrokerError> {
        self.enqueue(Arc::from(topic), None, payload)
    }

    /// Enqueue `payload` for the binding's topic
    ///
    /// The binding's filter runs inside the worker, not on the caller.
    pub fn send_filtered(&self, binding: &TopicBinding, payload: Bytes) -> Result<(), BrokerError> {
        let (topic, filter) = binding.parts();
        self.enqueue(topic, Some(filter), payload)
    }

    fn enqueue(
        &self,
        topic: Arc<str>,
        filter: Option<Arc<ContentFilter>>,
        payload: Bytes,
    ) -> Result<(), BrokerError> {
        if payload.is_empty() {
            return Err(BrokerError::EmptyPayload);
        }
        if self.input.is_closed() || self.pool.is_closed() {
            return Err(BrokerError::NotInitialized);
        }

        let input = self.input.clone();
        let metrics = Arc::clone(&self.metrics);
        let message = ProducerMessage::new(topic, payload);
        self.pool.submit(async move {
            if let Some(filter) = filter {
                if filter.suppress(&message.value) {
                    metrics.inc_suppressed();
                    observability::record_message_suppressed(&message.topic);
                    return;
                }
            }
            let topic = Arc::clone(&message.topic);
            match input.send(message).await {
                Ok(()) => {
                    metrics.inc_forwarded();
                    observability::record_message_enqueued(&topic);
                }
                Err(_) => warn!(topic = %topic, "Producer input closed, message dropped"),
            }
        })?;

        self.metrics.inc_enqueued();
        Ok(())
    }

    /// Whether `shutdown` has been called
    pub fn is_closed(&self) -> bool {
        self.input.is_closed()
    }

    pub fn metrics(&self) -> ProducerSnapshot {
        self.metrics.snapshot()
    }

    pub fn pool_metrics(&self) -> PoolSnapshot {
        self.pool.snapshot()
    }

    /// Drain the pool into the producer, flush deliveries, stop the drain loop
    ///
    /// Safe to call more than once.
    #[instrument(name = "producer_adapter_shutdown", skip(self), fields(transport = %self.transport))]
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;

        let background = match self.background.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(Background { producer, drain }) = background else {
            debug!("Producer adapter already shut down");
            return;
        };

        producer.close().await;
        if let Err(e) = drain.await {
            error!(error = ?e, "Drain loop panicked");
        }

        let snapshot = self.metrics.snapshot();
        info!(
            enqueued = snapshot.enqueued,
            suppressed = snapshot.suppressed,
            delivered = snapshot.delivered,
            failed = snapshot.failed,
            retried = snapshot.retried,
            "Producer adapter shut down"
        );
    }
}
