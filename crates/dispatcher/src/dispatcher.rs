//! Dispatcher - single loop draining the dispatch queue into workers

use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument};

use crate::worker::{worker_loop, Job, Slot, WorkerContext};
use crate::Task;

/// The loop that owns the execution slots of one pool
///
/// Pulls one task at a time, waits for a free execution permit, and hands
/// the task to the most recently used idle worker (or a new one).
pub(crate) struct DispatchLoop {
    ctx: WorkerContext,
    queue: async_channel::Receiver<Task>,
    worker_count: usize,
    permits: Arc<Semaphore>,
    idle_rx: mpsc::UnboundedReceiver<Slot>,
    idle: Vec<Slot>,
    workers: JoinSet<()>,
    next_worker_id: u64,
}

impl DispatchLoop {
    pub(crate) fn new(
        ctx: WorkerContext,
        idle_rx: mpsc::UnboundedReceiver<Slot>,
        queue: async_channel::Receiver<Task>,
        worker_count: usize,
    ) -> Self {
        Self {
            ctx,
            queue,
            worker_count,
            permits: Arc::new(Semaphore::new(worker_count)),
            idle_rx,
            idle: Vec::with_capacity(worker_count),
            workers: JoinSet::new(),
            next_worker_id: 0,
        }
    }

    /// Run until the queue is closed and drained
    #[instrument(name = "pool_dispatch_loop", skip(self), fields(pool = %self.ctx.pool))]
    pub(crate) async fn run(mut self) {
        info!(workers = self.worker_count, "Dispatcher started");

        let mut dispatched: u64 = 0;
        while let Ok(task) = self.queue.recv().await {
            let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
                error!("Execution permits closed unexpectedly");
                break;
            };
            self.collect_idle();
            self.assign(task, permit);

            dispatched += 1;
            if dispatched.is_multiple_of(1000) {
                debug!(tasks = dispatched, queue_len = self.queue.len(), "Dispatcher progress");
                observability::record_queue_depth(&self.ctx.pool, self.queue.len());
            }
        }

        info!(tasks = dispatched, "Dispatch queue closed, shutting down");
        self.stop_workers().await;
        info!("Dispatcher shutdown complete");
    }

    /// Pick up workers that finished since the last task, reap exited ones
    fn collect_idle(&mut self) {
        while let Ok(slot) = self.idle_rx.try_recv() {
            self.idle.push(slot);
        }
        while self.workers.try_join_next().is_some() {}
    }

    fn assign(&mut self, mut task: Task, mut permit: OwnedSemaphorePermit) {
        while let Some(slot) = self.idle.pop() {
            let tx = slot.tx.clone();
            match tx.try_send(Job { task, permit, slot }) {
                Ok(()) => return,
                // Worker was reclaimed after its idle timeout
                Err(TrySendError::Closed(job) | TrySendError::Full(job)) => {
                    task = job.task;
                    permit = job.permit;
                }
            }
        }

        let slot = self.spawn_worker();
        let tx = slot.tx.clone();
        if tx.try_send(Job { task, permit, slot }).is_err() {
            error!("Fresh worker rejected task, task dropped");
        }
    }

    fn spawn_worker(&mut self) -> Slot {
        let id = self.next_worker_id;
        self.next_worker_id += 1;

        let (tx, rx) = mpsc::channel(1);
        self.workers.spawn(worker_loop(id, self.ctx.clone(), rx));
        Slot { tx }
    }

    async fn stop_workers(mut self) {
        // Every permit back means every in-flight task finished and its
        // worker already returned its slot.
        // worker_count is capped well below u32::MAX by pool validation
        let Ok(all) = u32::try_from(self.worker_count) else {
            error!(workers = self.worker_count, "Worker count exceeds permit range");
            return;
        };
        if self.permits.acquire_many(all).await.is_err() {
            error!("Execution permits closed unexpectedly");
        }
        self.collect_idle();

        // Dropping the idle slots closes every worker inbox
        self.idle.clear();
        while let Some(result) = self.workers.join_next().await {
            if let Err(e) = result {
                error!(error = ?e, "Worker task failed");
            }
        }
    }
}
