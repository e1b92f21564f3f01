//! Run statistics.

use std::time::Duration;

use broker::ProducerSnapshot;
use dispatcher::PoolSnapshot;
use observability::{RunningStats, StatsSummary};

/// Statistics from a `run` invocation
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Records handed to the logger
    pub emitted: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Logger call latency (µs)
    pub latency_us: RunningStats,

    /// Producer counters, when forwarding was on
    pub producer: Option<ProducerSnapshot>,

    /// Worker pool counters, when forwarding was on
    pub pool: Option<PoolSnapshot>,
}

impl RunStats {
    /// Records per second
    pub fn rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.emitted as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Run Statistics ===\n");
        println!("Overview");
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Records emitted: {}", self.emitted);
        println!("  Rate: {:.2}/s", self.rate());
        println!("  Emit latency (us): {}", StatsSummary::from(&self.latency_us));

        match (&self.producer, &self.pool) {
            (Some(producer), Some(pool)) => {
                println!("\nKafka Forwarding");
                println!("  Enqueued: {}", producer.enqueued);
                println!("  Suppressed by filter: {}", producer.suppressed);
                println!("  Delivered: {}", producer.delivered);
                println!("  Failed: {}", producer.failed);
                println!("  Retries: {}", producer.retried);

                println!("\nWorker Pool");
                println!("  Tasks completed: {}", pool.completed);
                println!("  Panicked tasks: {}", pool.panicked);
                println!("  Peak concurrency: {}", pool.peak_active);
                println!("  Backpressure waits: {}", pool.backpressure_waits);
                println!("  Workers reclaimed: {}", pool.reclaimed_workers);
            }
            _ => println!("\nKafka Forwarding: disabled"),
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate() {
        let stats = RunStats {
            emitted: 500,
            duration: Duration::from_secs(2),
            ..RunStats::default()
        };
        assert!((stats.rate() - 250.0).abs() < 1e-9);
        assert_eq!(RunStats::default().rate(), 0.0);
    }
}
