//! Drain loop - consumes producer outcomes for the adapter's lifetime

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use crate::message::{ProducerError, ProducerMessage};
use crate::metrics::ProducerMetrics;
use crate::producer::Notifications;

/// Spawn the drain loop
///
/// Runs until both notification channels are closed. Failures are logged
/// and counted; they never stop the loop.
pub fn spawn_drain_loop(
    notifications: Notifications,
    metrics: Arc<ProducerMetrics>,
) -> JoinHandle<()> {
    tokio::spawn(drain_loop(notifications, metrics))
}

#[instrument(name = "producer_drain_loop", skip_all)]
async fn drain_loop(notifications: Notifications, metrics: Arc<ProducerMetrics>) {
    let Notifications { successes, errors } = notifications;
    let mut successes_open = true;
    let mut errors_open = true;

    while successes_open || errors_open {
        tokio::select! {
            result = successes.recv(), if successes_open => match result {
                Ok(message) => on_success(&metrics, &message),
                Err(_) => successes_open = false,
            },
            result = errors.recv(), if errors_open => match result {
                Ok(failure) => on_error(&metrics, &failure),
                Err(_) => errors_open = false,
            },
        }
    }
    debug!("Producer notifications closed, drain loop exiting");
}

fn on_success(metrics: &ProducerMetrics, message: &ProducerMessage) {
    metrics.inc_delivered();
    observability::record_delivery(&message.topic, true);
    observability::record_delivery_latency_ms(message.age().as_secs_f64() * 1000.0);
}

fn on_error(metrics: &ProducerMetrics, failure: &ProducerError) {
    metrics.inc_failed();
    observability::record_delivery(&failure.message.topic, false);
    error!(
        topic = %failure.message.topic,
        attempts = failure.attempts,
        bytes = failure.message.value.len(),
        error = %failure.error,
        "Failed to produce message to Kafka"
    );
}
