//! # Dispatcher
//!
//! 有界工作池模块。
//!
//! 负责：
//! - 接收发送任务 (有界队列，满时阻塞调用方)
//! - 单一分发循环，将任务交给固定数量的 worker 并发执行
//! - 空闲 worker 超时回收，按需重建
//! - 隔离 panic 的任务，不影响其他 worker

mod dispatcher;
pub mod error;
pub mod metrics;
pub mod pool;
mod worker;

pub use contracts::PoolSettings;
pub use error::DispatcherError;
pub use metrics::{PoolMetrics, PoolSnapshot};
pub use pool::{Task, WorkerPool};
