//! WorkerPool - bounded dispatch queue in front of a fixed set of workers

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use contracts::{PoolSettings, MAX_WORKER_COUNT, MIN_QUEUE_CAPACITY};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use crate::dispatcher::DispatchLoop;
use crate::error::DispatcherError;
use crate::metrics::{PoolMetrics, PoolSnapshot};
use crate::worker::WorkerContext;

/// A deferred unit of work executed by the pool
pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Handle to a running worker pool
///
/// Submissions go through a bounded queue; a single dispatcher loop hands
/// queued tasks to at most `worker_count` concurrently running workers.
pub struct WorkerPool {
    name: Arc<str>,
    settings: PoolSettings,
    queue: async_channel::Sender<Task>,
    metrics: Arc<PoolMetrics>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Validate the settings and spawn the dispatcher loop
    ///
    /// # Errors
    /// - Settings out of range
    /// - No Tokio runtime on the calling thread
    #[instrument(name = "worker_pool_start", skip(settings), fields(pool = %settings.name))]
    pub fn start(settings: PoolSettings) -> Result<Self, DispatcherError> {
        Self::validate(&settings)?;
        let runtime = Handle::try_current().map_err(|_| DispatcherError::NoRuntime {
            pool: settings.name.clone(),
        })?;

        let name: Arc<str> = Arc::from(settings.name.as_str());
        let (queue_tx, queue_rx) = async_channel::bounded(settings.queue_capacity);
        let (idle_tx, idle_rx) = mpsc::unbounded_channel();
        let metrics = Arc::new(PoolMetrics::new());

        let ctx = WorkerContext {
            pool: Arc::clone(&name),
            idle_timeout: settings.idle_timeout,
            idle_tx,
            metrics: Arc::clone(&metrics),
        };
        let dispatch = DispatchLoop::new(ctx, idle_rx, queue_rx, settings.worker_count);
        let handle = runtime.spawn(dispatch.run());

        info!(
            workers = settings.worker_count,
            queue_capacity = settings.queue_capacity,
            idle_timeout_ms = settings.idle_timeout.as_millis() as u64,
            "Worker pool started"
        );

        Ok(Self {
            name,
            settings,
            queue: queue_tx,
            metrics,
            dispatcher: Mutex::new(Some(handle)),
        })
    }

    fn validate(settings: &PoolSettings) -> Result<(), DispatcherError> {
        if settings.worker_count == 0 {
            return Err(DispatcherError::invalid_settings(
                &settings.name,
                "worker_count must be >= 1",
            ));
        }
        if settings.worker_count > MAX_WORKER_COUNT {
            return Err(DispatcherError::invalid_settings(
                &settings.name,
                format!(
                    "worker_count must be <= {MAX_WORKER_COUNT}, got {}",
                    settings.worker_count
                ),
            ));
        }
        if settings.queue_capacity < MIN_QUEUE_CAPACITY {
            return Err(DispatcherError::invalid_settings(
                &settings.name,
                format!(
                    "queue_capacity must be >= {MIN_QUEUE_CAPACITY}, got {}",
                    settings.queue_capacity
                ),
            ));
        }
        if settings.idle_timeout.is_zero() {
            return Err(DispatcherError::invalid_settings(
                &settings.name,
                "idle_timeout must be > 0",
            ));
        }
        Ok(())
    }

    /// Get pool name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the settings the pool was started with
    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Get shared metrics
    pub fn metrics(&self) -> &Arc<PoolMetrics> {
        &self.metrics
    }

    /// Get snapshot of metrics including the current queue length
    pub fn snapshot(&self) -> PoolSnapshot {
        self.metrics.snapshot(self.queue.len())
    }

    /// Number of tasks waiting in the dispatch queue
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Whether `shutdown` has been called
    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    /// Enqueue a task, blocking the calling thread while the queue is full
    ///
    /// Never drops a task. Do not call from a current-thread runtime while
    /// the queue may be full; use [`submit_async`](Self::submit_async) there.
    pub fn submit<F>(&self, task: F) -> Result<(), DispatcherError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task: Task = Box::pin(task);
        match self.queue.try_send(task) {
            Ok(()) => {}
            Err(async_channel::TrySendError::Full(task)) => {
                self.metrics.inc_backpressure_waits();
                debug!(pool = %self.name, "Dispatch queue full, waiting for space");
                self.queue.send_blocking(task).map_err(|_| self.closed())?;
            }
            Err(async_channel::TrySendError::Closed(_)) => return Err(self.closed()),
        }
        self.accepted();
        Ok(())
    }

    /// Enqueue a task, suspending while the queue is full
    pub async fn submit_async<F>(&self, task: F) -> Result<(), DispatcherError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task: Task = Box::pin(task);
        if self.queue.is_full() {
            self.metrics.inc_backpressure_waits();
        }
        self.queue.send(task).await.map_err(|_| self.closed())?;
        self.accepted();
        Ok(())
    }

    /// Enqueue a task without waiting
    ///
    /// Returns [`DispatcherError::Full`] when the queue has no room.
    pub fn try_submit<F>(&self, task: F) -> Result<(), DispatcherError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task: Task = Box::pin(task);
        match self.queue.try_send(task) {
            Ok(()) => {
                self.accepted();
                Ok(())
            }
            Err(async_channel::TrySendError::Full(_)) => Err(DispatcherError::Full {
                pool: self.name.to_string(),
            }),
            Err(async_channel::TrySendError::Closed(_)) => Err(self.closed()),
        }
    }

    /// Close the queue, run everything still queued, and join the dispatcher
    ///
    /// Safe to call more than once.
    #[instrument(name = "worker_pool_shutdown", skip(self), fields(pool = %self.name))]
    pub async fn shutdown(&self) {
        self.queue.close();

        let handle = match self.dispatcher.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(pool = %self.name, error = ?e, "Dispatcher task panicked");
            }
        }

        let snapshot = self.snapshot();
        info!(
            submitted = snapshot.submitted,
            completed = snapshot.completed,
            panicked = snapshot.panicked,
            peak_active = snapshot.peak_active,
            "Worker pool shut down"
        );
    }

    fn accepted(&self) {
        self.metrics.inc_submitted();
        observability::record_task_submitted(&self.name);
    }

    fn closed(&self) -> DispatcherError {
        DispatcherError::Closed {
            pool: self.name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Semaphore;
    use tokio::time::{sleep, Instant};

    fn settings(worker_count: usize, queue_capacity: usize) -> PoolSettings {
        PoolSettings {
            name: "test-pool".to_string(),
            worker_count,
            queue_capacity,
            idle_timeout: Duration::from_secs(4),
        }
    }

    async fn wait_until(what: &str, cond: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_pool_runs_all_tasks() {
        let pool = WorkerPool::start(settings(4, 100)).unwrap();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..50 {
            let count = Arc::clone(&count);
            pool.submit_async(async move {
                count.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }

        pool.shutdown().await;
        assert_eq!(count.load(Ordering::SeqCst), 50);
        let snapshot = pool.snapshot();
        assert_eq!(snapshot.submitted, 50);
        assert_eq!(snapshot.completed, 50);
        assert_eq!(snapshot.live_workers, 0);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let err = WorkerPool::start(settings(0, 100)).err().unwrap();
        assert!(matches!(err, DispatcherError::InvalidSettings { .. }));

        let err = WorkerPool::start(settings(2, 10)).err().unwrap();
        assert!(err.to_string().contains(">= 100"), "got: {err}");

        // Rejected before any semaphore is sized from it
        let err = WorkerPool::start(settings(usize::MAX, 100)).err().unwrap();
        assert!(matches!(err, DispatcherError::InvalidSettings { .. }));
        assert!(err.to_string().contains("worker_count"), "got: {err}");

        let mut zero_timeout = settings(2, 100);
        zero_timeout.idle_timeout = Duration::ZERO;
        assert!(WorkerPool::start(zero_timeout).is_err());
    }

    #[test]
    fn test_start_requires_runtime() {
        let err = WorkerPool::start(settings(2, 100)).err().unwrap();
        assert!(matches!(err, DispatcherError::NoRuntime { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_full_queue_blocks_until_space() {
        let pool = Arc::new(WorkerPool::start(settings(1, 100)).unwrap());
        let gate = Arc::new(Semaphore::new(0));

        // Occupy the only worker, then park a second task in the dispatcher
        for _ in 0..2 {
            let gate = Arc::clone(&gate);
            pool.submit(async move {
                let _ = gate.acquire().await;
            })
            .unwrap();
        }
        wait_until("first task running", || pool.metrics().active() == 1).await;
        wait_until("dispatcher holding second task", || pool.queue_len() == 0).await;

        // Exactly `queue_capacity` tasks fit without blocking
        for _ in 0..100 {
            pool.try_submit(async {}).unwrap();
        }
        let err = pool.try_submit(async {}).err().unwrap();
        assert!(matches!(err, DispatcherError::Full { .. }));

        let blocked_pool = Arc::clone(&pool);
        let blocked = tokio::task::spawn_blocking(move || blocked_pool.submit(async {}));
        sleep(Duration::from_millis(50)).await;
        assert!(!blocked.is_finished(), "submit must wait while the queue is full");

        gate.add_permits(2);
        blocked.await.unwrap().unwrap();

        pool.shutdown().await;
        let snapshot = pool.snapshot();
        assert_eq!(snapshot.completed, 103);
        assert!(snapshot.backpressure_waits >= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submitters_run_each_task_once() {
        const SUBMITTERS: usize = 8;
        const PER_SUBMITTER: usize = 200;

        let pool = Arc::new(WorkerPool::start(settings(3, 100)).unwrap());
        let runs: Arc<Vec<AtomicUsize>> = Arc::new(
            (0..SUBMITTERS * PER_SUBMITTER)
                .map(|_| AtomicUsize::new(0))
                .collect(),
        );

        let mut submitters = Vec::new();
        for s in 0..SUBMITTERS {
            let pool = Arc::clone(&pool);
            let runs = Arc::clone(&runs);
            submitters.push(tokio::task::spawn_blocking(move || {
                for i in 0..PER_SUBMITTER {
                    let id = s * PER_SUBMITTER + i;
                    let runs = Arc::clone(&runs);
                    pool.submit(async move {
                        runs[id].fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap();
                }
            }));
        }
        for submitter in submitters {
            submitter.await.unwrap();
        }

        pool.shutdown().await;
        assert!(runs.iter().all(|r| r.load(Ordering::SeqCst) == 1));
        assert!(pool.snapshot().peak_active <= 3);
    }

    #[tokio::test]
    async fn test_panicking_task_is_isolated() {
        let pool = WorkerPool::start(settings(1, 100)).unwrap();
        let count = Arc::new(AtomicUsize::new(0));

        pool.submit_async(async { panic!("task failure") }).await.unwrap();
        let after = Arc::clone(&count);
        pool.submit_async(async move {
            after.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();

        pool.shutdown().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        let snapshot = pool.snapshot();
        assert_eq!(snapshot.panicked, 1);
        assert_eq!(snapshot.completed, 2);
    }

    #[tokio::test]
    async fn test_idle_workers_are_reclaimed_and_recreated() {
        let mut short_idle = settings(2, 100);
        short_idle.idle_timeout = Duration::from_millis(50);
        let pool = WorkerPool::start(short_idle).unwrap();

        for _ in 0..4 {
            pool.submit_async(sleep(Duration::from_millis(5))).await.unwrap();
        }
        wait_until("first batch", || pool.metrics().completed() == 4).await;
        wait_until("workers reclaimed", || pool.metrics().live_workers() == 0).await;
        assert!(pool.metrics().reclaimed_workers() >= 1);

        let count = Arc::new(AtomicUsize::new(0));
        let after = Arc::clone(&count);
        pool.submit_async(async move {
            after.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();

        pool.shutdown().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(pool.snapshot().completed, 5);
    }

    #[tokio::test]
    async fn test_concurrency_bounded_by_worker_count() {
        let pool = WorkerPool::start(settings(2, 100)).unwrap();
        for _ in 0..40 {
            pool.submit_async(sleep(Duration::from_millis(1))).await.unwrap();
        }
        pool.shutdown().await;
        let snapshot = pool.snapshot();
        assert_eq!(snapshot.completed, 40);
        assert!(snapshot.peak_active <= 2, "peak {}", snapshot.peak_active);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_fails() {
        let pool = WorkerPool::start(settings(1, 100)).unwrap();
        pool.shutdown().await;
        pool.shutdown().await;

        assert!(pool.is_closed());
        assert!(matches!(
            pool.submit(async {}).err().unwrap(),
            DispatcherError::Closed { .. }
        ));
        assert!(matches!(
            pool.try_submit(async {}).err().unwrap(),
            DispatcherError::Closed { .. }
        ));
    }
}
