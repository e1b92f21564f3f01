//! Pool metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single worker pool
#[derive(Debug, Default)]
pub struct PoolMetrics {
    /// Tasks accepted into the dispatch queue
    submitted: AtomicU64,
    /// Tasks that ran to completion (including panicked ones)
    completed: AtomicU64,
    /// Tasks that panicked
    panicked: AtomicU64,
    /// Tasks executing right now
    active: AtomicUsize,
    /// Highest `active` value observed
    peak_active: AtomicUsize,
    /// Worker tasks currently alive
    live_workers: AtomicUsize,
    /// Workers that exited after the idle timeout
    reclaimed_workers: AtomicU64,
    /// Submissions that found the queue full and had to wait
    backpressure_waits: AtomicU64,
}

impl PoolMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total submitted count
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Increment submitted count
    pub fn inc_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total completed count
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// Get panicked count
    pub fn panicked(&self) -> u64 {
        self.panicked.load(Ordering::Relaxed)
    }

    /// Get number of tasks executing right now
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Get the highest number of concurrently executing tasks
    pub fn peak_active(&self) -> usize {
        self.peak_active.load(Ordering::Relaxed)
    }

    /// Mark a task as started
    pub fn task_started(&self) {
        let now = self.active.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_active.fetch_max(now, Ordering::Relaxed);
    }

    /// Mark a task as finished
    pub fn task_finished(&self, panicked: bool) {
        if panicked {
            self.panicked.fetch_add(1, Ordering::Relaxed);
        }
        self.active.fetch_sub(1, Ordering::AcqRel);
        self.completed.fetch_add(1, Ordering::Release);
    }

    /// Get number of live workers
    pub fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::Relaxed)
    }

    /// Mark a worker as spawned
    pub fn worker_spawned(&self) {
        self.live_workers.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark a worker as exited
    pub fn worker_exited(&self, reclaimed: bool) {
        if reclaimed {
            self.reclaimed_workers.fetch_add(1, Ordering::Relaxed);
        }
        self.live_workers.fetch_sub(1, Ordering::Relaxed);
    }

    /// Get reclaimed worker count
    pub fn reclaimed_workers(&self) -> u64 {
        self.reclaimed_workers.load(Ordering::Relaxed)
    }

    /// Get backpressure wait count
    pub fn backpressure_waits(&self) -> u64 {
        self.backpressure_waits.load(Ordering::Relaxed)
    }

    /// Increment backpressure wait count
    pub fn inc_backpressure_waits(&self) {
        self.backpressure_waits.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self, queue_len: usize) -> PoolSnapshot {
        PoolSnapshot {
            queue_len,
            submitted: self.submitted(),
            completed: self.completed(),
            panicked: self.panicked(),
            active: self.active(),
            peak_active: self.peak_active(),
            live_workers: self.live_workers(),
            reclaimed_workers: self.reclaimed_workers(),
            backpressure_waits: self.backpressure_waits(),
        }
    }
}

/// Snapshot of pool metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub queue_len: usize,
    pub submitted: u64,
    pub completed: u64,
    pub panicked: u64,
    pub active: usize,
    pub peak_active: usize,
    pub live_workers: usize,
    pub reclaimed_workers: u64,
    pub backpressure_waits: u64,
}
