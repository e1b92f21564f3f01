//! AsyncProducer - buffered, retrying record delivery
//!
//! Messages go in through `input`; every outcome comes back out through the
//! `successes` and `errors` notification channels. Both notification channels
//! are bounded and MUST be drained, otherwise delivery stalls once they fill.

use std::sync::Arc;
use std::time::Duration;

use contracts::{BrokerTransport, ContractError};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, instrument, warn};

use crate::message::{ProducerError, ProducerMessage};
use crate::metrics::ProducerMetrics;

/// Capacity of the input and notification channels
pub const CHANNEL_BUFFER_SIZE: usize = 10_240;
/// Redelivery attempts after the first failure
pub const MAX_RETRIES: u32 = 2;
/// Pause between delivery attempts
pub const RETRY_BACKOFF: Duration = Duration::from_millis(100);
/// Deliveries awaiting broker acknowledgement at once
pub const MAX_IN_FLIGHT: usize = 64;
/// Upper bound on a single delivery attempt
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Producer tuning
#[derive(Debug, Clone)]
pub struct ProducerSettings {
    pub channel_buffer_size: usize,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub max_in_flight: usize,
    /// An attempt still pending after this long counts as failed
    pub delivery_timeout: Duration,
    /// Publish acknowledged messages on the successes channel
    pub return_successes: bool,
}

impl Default for ProducerSettings {
    fn default() -> Self {
        Self {
            channel_buffer_size: CHANNEL_BUFFER_SIZE,
            max_retries: MAX_RETRIES,
            retry_backoff: RETRY_BACKOFF,
            max_in_flight: MAX_IN_FLIGHT,
            delivery_timeout: DELIVERY_TIMEOUT,
            return_successes: true,
        }
    }
}

/// Receiving ends of the producer's outcome channels
pub struct Notifications {
    pub successes: async_channel::Receiver<ProducerMessage>,
    pub errors: async_channel::Receiver<ProducerError>,
}

/// Handle to a running producer
pub struct AsyncProducer {
    input: async_channel::Sender<ProducerMessage>,
    task: JoinHandle<()>,
}

impl AsyncProducer {
    /// Spawn the delivery loop on the current runtime
    pub fn spawn<T>(
        transport: Arc<T>,
        settings: ProducerSettings,
        metrics: Arc<ProducerMetrics>,
    ) -> (Self, Notifications)
    where
        T: BrokerTransport + Sync + 'static,
    {
        let capacity = settings.channel_buffer_size.max(1);
        let (input_tx, input_rx) = async_channel::bounded(capacity);
        let (successes_tx, successes_rx) = async_channel::bounded(capacity);
        let (errors_tx, errors_rx) = async_channel::bounded(capacity);

        let outcomes = Outcomes {
            successes: successes_tx,
            errors: errors_tx,
            settings: Arc::new(settings),
            metrics,
        };
        let task = tokio::spawn(delivery_loop(transport, input_rx, outcomes));

        (
            Self {
                input: input_tx,
                task,
            },
            Notifications {
                successes: successes_rx,
                errors: errors_rx,
            },
        )
    }

    /// Sending side of the input channel
    pub fn input(&self) -> &async_channel::Sender<ProducerMessage> {
        &self.input
    }

    /// Stop accepting input, finish in-flight deliveries, and wait
    ///
    /// The notification channels close once the last outcome is published.
    pub async fn close(self) {
        self.input.close();
        if let Err(e) = self.task.await {
            error!(error = ?e, "Producer delivery loop panicked");
        }
    }
}

/// Everything a single delivery needs besides the transport
#[derive(Clone)]
struct Outcomes {
    successes: async_channel::Sender<ProducerMessage>,
    errors: async_channel::Sender<ProducerError>,
    settings: Arc<ProducerSettings>,
    metrics: Arc<ProducerMetrics>,
}

#[instrument(name = "producer_delivery_loop", skip_all, fields(transport = %transport.name()))]
async fn delivery_loop<T>(
    transport: Arc<T>,
    input: async_channel::Receiver<ProducerMessage>,
    outcomes: Outcomes,
) where
    T: BrokerTransport + Sync + 'static,
{
    info!("Producer started");

    let max_in_flight = outcomes.settings.max_in_flight.max(1);
    let mut in_flight = JoinSet::new();
    while let Ok(message) = input.recv().await {
        while in_flight.len() >= max_in_flight {
            if let Some(Err(e)) = in_flight.join_next().await {
                error!(error = ?e, "Delivery task failed");
            }
        }
        in_flight.spawn(deliver(Arc::clone(&transport), message, outcomes.clone()));
        while let Some(result) = in_flight.try_join_next() {
            if let Err(e) = result {
                error!(error = ?e, "Delivery task failed");
            }
        }
    }

    debug!(in_flight = in_flight.len(), "Producer input closed, flushing");
    while let Some(result) = in_flight.join_next().await {
        if let Err(e) = result {
            error!(error = ?e, "Delivery task failed");
        }
    }
    info!("Producer stopped");
}

async fn deliver<T>(transport: Arc<T>, message: ProducerMessage, outcomes: Outcomes)
where
    T: BrokerTransport + Sync + 'static,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        let timeout = outcomes.settings.delivery_timeout;
        let result = tokio::time::timeout(timeout, transport.deliver(&message.topic, &message.value))
            .await
            .unwrap_or_else(|_| {
                Err(ContractError::broker_delivery(
                    &*message.topic,
                    format!("no acknowledgement within {timeout:?}"),
                ))
            });
        match result {
            Ok(()) => {
                if outcomes.settings.return_successes {
                    let _ = outcomes.successes.send(message).await;
                }
                return;
            }
            Err(e) if attempts <= outcomes.settings.max_retries => {
                warn!(
                    topic = %message.topic,
                    attempt = attempts,
                    error = %e,
                    "Delivery failed, retrying"
                );
                outcomes.metrics.inc_retried();
                observability::record_delivery_retry(&message.topic);
                tokio::time::sleep(outcomes.settings.retry_backoff).await;
            }
            Err(error) => {
                let failure = ProducerError {
                    message,
                    error,
                    attempts,
                };
                let _ = outcomes.errors.send(failure).await;
                return;
            }
        }
    }
}
