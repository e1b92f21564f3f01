//! Worker pool configuration contracts shared by the dispatcher and the config loader.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ContractError;

/// Default pool name
pub const DEFAULT_POOL_NAME: &str = "kafka-work-pool";
/// Default number of concurrent workers
pub const DEFAULT_WORKER_COUNT: usize = 16;
/// Default dispatch queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024 * 1024;
/// Default idle timeout before a worker is reclaimed
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(4);
/// Smallest accepted dispatch queue capacity
pub const MIN_QUEUE_CAPACITY: usize = 100;
/// Largest accepted number of concurrent workers
pub const MAX_WORKER_COUNT: usize = 65_536;

/// Worker pool section as written in the config file
///
/// Values are signed so that negative numbers reach validation and are
/// reported with their field name instead of failing inside the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    /// Pool name (used in logs)
    #[serde(default)]
    pub name: Option<String>,

    /// Number of concurrent workers
    #[serde(default, alias = "worker_size", alias = "workersize")]
    pub worker_count: Option<i64>,

    /// Dispatch queue capacity
    #[serde(default, alias = "pool_size", alias = "poolsize")]
    pub queue_capacity: Option<i64>,

    /// Idle timeout in seconds
    #[serde(default, alias = "timeout")]
    pub idle_timeout_secs: Option<i64>,
}

/// Validated worker pool settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    /// Pool name
    pub name: String,
    /// Number of concurrent workers
    pub worker_count: usize,
    /// Dispatch queue capacity
    pub queue_capacity: usize,
    /// Idle timeout before a worker is reclaimed
    pub idle_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_POOL_NAME.to_string(),
            worker_count: DEFAULT_WORKER_COUNT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl PoolSettings {
    /// Resolve settings from an optional config section
    ///
    /// An absent section yields the defaults, an omitted field yields that
    /// field's default, and a present but malformed value is an error.
    pub fn from_config(config: Option<&WorkerPoolConfig>) -> Result<Self, ContractError> {
        let Some(config) = config else {
            return Ok(Self::default());
        };

        let defaults = Self::default();
        let worker_count = match config.worker_count {
            Some(value) => {
                let count = positive("worker_pool.worker_count", value)?;
                if count > MAX_WORKER_COUNT {
                    return Err(ContractError::config_validation(
                        "worker_pool.worker_count",
                        format!("worker_count must be <= {MAX_WORKER_COUNT}, got {count}"),
                    ));
                }
                count
            }
            None => defaults.worker_count,
        };
        let queue_capacity = match config.queue_capacity {
            Some(value) => {
                let capacity = positive("worker_pool.queue_capacity", value)?;
                if capacity < MIN_QUEUE_CAPACITY {
                    return Err(ContractError::config_validation(
                        "worker_pool.queue_capacity",
                        format!("queue_capacity must be >= {MIN_QUEUE_CAPACITY}, got {capacity}"),
                    ));
                }
                capacity
            }
            None => defaults.queue_capacity,
        };
        let idle_timeout = match config.idle_timeout_secs {
            Some(value) => Duration::from_secs(positive("worker_pool.idle_timeout_secs", value)? as u64),
            None => defaults.idle_timeout,
        };
        let name = match &config.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => defaults.name,
        };

        Ok(Self {
            name,
            worker_count,
            queue_capacity,
            idle_timeout,
        })
    }
}

fn positive(field: &str, value: i64) -> Result<usize, ContractError> {
    if value < 0 {
        return Err(ContractError::config_validation(
            field,
            format!("must not be negative, got {value}"),
        ));
    }
    if value == 0 {
        return Err(ContractError::config_validation(field, "must be > 0"));
    }
    usize::try_from(value)
        .map_err(|_| ContractError::config_validation(field, format!("value {value} is too large")))
}
