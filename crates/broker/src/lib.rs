//! # Broker
//!
//! Kafka 生产者适配层：
//! - `ProducerAdapter`: 进程级唯一入口，经工作池异步投递
//! - `AsyncProducer`: 带重试的投递循环，结果写入 successes / errors 通道
//! - drain loop: 持续消费投递结果，错误只记录不致命
//! - `ContentFilter`: 按 `msg` 标签丢弃记录
//!
//! 真实 Kafka 连接位于 `kafka` feature 之后；`mock::MockTransport` 用于测试。

mod adapter;
mod drain;
pub mod error;
pub mod filter;
#[cfg(feature = "kafka")]
pub mod kafka;
mod message;
pub mod metrics;
pub mod mock;
pub mod producer;

pub use adapter::ProducerAdapter;
pub use drain::spawn_drain_loop;
pub use error::BrokerError;
pub use filter::{ContentFilter, TopicBinding};
#[cfg(feature = "kafka")]
pub use kafka::KafkaTransport;
pub use message::{ProducerError, ProducerMessage};
pub use metrics::{ProducerMetrics, ProducerSnapshot};
pub use producer::{AsyncProducer, Notifications, ProducerSettings};
