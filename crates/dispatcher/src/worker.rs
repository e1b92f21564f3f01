//! Worker - one reusable execution slot of the pool

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{mpsc, OwnedSemaphorePermit};
use tracing::{debug, error, instrument};

use crate::metrics::PoolMetrics;
use crate::Task;

/// Address of an idle worker
///
/// Travels with each job so the worker can hand itself back to the
/// dispatcher once the job is done. While a worker sits idle nobody but the
/// dispatcher holds its slot, so dropping the idle list stops the worker.
pub(crate) struct Slot {
    pub(crate) tx: mpsc::Sender<Job>,
}

/// A task bound to the execution permit it runs under
pub(crate) struct Job {
    pub(crate) task: Task,
    pub(crate) permit: OwnedSemaphorePermit,
    pub(crate) slot: Slot,
}

/// Shared context every worker of a pool runs with
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub(crate) pool: Arc<str>,
    pub(crate) idle_timeout: Duration,
    pub(crate) idle_tx: mpsc::UnboundedSender<Slot>,
    pub(crate) metrics: Arc<PoolMetrics>,
}

/// Worker loop: run jobs until the pool stops or the idle timeout expires
#[instrument(
    name = "pool_worker_loop",
    skip(ctx, rx),
    fields(pool = %ctx.pool)
)]
pub(crate) async fn worker_loop(id: u64, ctx: WorkerContext, mut rx: mpsc::Receiver<Job>) {
    ctx.metrics.worker_spawned();
    debug!(worker = id, "Worker started");

    let mut reclaimed = false;
    loop {
        let job = match tokio::time::timeout(ctx.idle_timeout, rx.recv()).await {
            Ok(Some(job)) => job,
            // Pool shut down, slot dropped
            Ok(None) => break,
            Err(_) => {
                // A job may have been assigned right as the timeout fired
                rx.close();
                if let Ok(job) = rx.try_recv() {
                    run_job(id, &ctx, job).await;
                }
                reclaimed = true;
                break;
            }
        };
        run_job(id, &ctx, job).await;
    }

    ctx.metrics.worker_exited(reclaimed);
    if reclaimed {
        observability::record_worker_reclaimed(&ctx.pool);
        debug!(worker = id, "Worker reclaimed after idle timeout");
    } else {
        debug!(worker = id, "Worker stopped");
    }
}

async fn run_job(id: u64, ctx: &WorkerContext, job: Job) {
    let Job { task, permit, slot } = job;

    ctx.metrics.task_started();
    let outcome = AssertUnwindSafe(task).catch_unwind().await;
    let panicked = outcome.is_err();
    ctx.metrics.task_finished(panicked);
    observability::record_task_completed(&ctx.pool, panicked);

    if let Err(payload) = outcome {
        error!(
            pool = %ctx.pool,
            worker = id,
            panic = %panic_message(payload.as_ref()),
            "Task panicked"
        );
        // Continue processing - don't crash on single failure
    }

    // Hand the slot back before releasing the permit, so the dispatcher finds
    // this worker idle as soon as it can schedule again.
    let _ = ctx.idle_tx.send(slot);
    drop(permit);
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
