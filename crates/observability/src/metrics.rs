//! 管道指标收集模块
//!
//! 工作池、生产者、过滤器的运行指标，通过 `metrics` facade 上报。

use metrics::{counter, gauge, histogram};

/// 记录任务入队
pub fn record_task_submitted(pool: &str) {
    counter!("vlog_pool_tasks_submitted_total", "pool" => pool.to_string()).increment(1);
}

/// 记录任务执行完成
pub fn record_task_completed(pool: &str, panicked: bool) {
    let status = if panicked { "panicked" } else { "ok" };
    counter!(
        "vlog_pool_tasks_completed_total",
        "pool" => pool.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录分发队列深度
pub fn record_queue_depth(pool: &str, depth: usize) {
    gauge!("vlog_pool_queue_depth", "pool" => pool.to_string()).set(depth as f64);
}

/// 记录空闲 worker 回收
pub fn record_worker_reclaimed(pool: &str) {
    counter!("vlog_pool_workers_reclaimed_total", "pool" => pool.to_string()).increment(1);
}

/// 记录消息被过滤
pub fn record_message_suppressed(topic: &str) {
    counter!("vlog_messages_suppressed_total", "topic" => topic.to_string()).increment(1);
}

/// 记录消息进入生产者
pub fn record_message_enqueued(topic: &str) {
    counter!("vlog_messages_enqueued_total", "topic" => topic.to_string()).increment(1);
}

/// 记录投递结果
pub fn record_delivery(topic: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "vlog_messages_delivered_total",
        "topic" => topic.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录投递重试
pub fn record_delivery_retry(topic: &str) {
    counter!("vlog_delivery_retries_total", "topic" => topic.to_string()).increment(1);
}

/// 记录投递延迟 (从入队到 broker 确认)
pub fn record_delivery_latency_ms(latency_ms: f64) {
    histogram!("vlog_delivery_latency_ms").record(latency_ms);
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}
