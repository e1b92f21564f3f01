//! # Logger
//!
//! 应用侧日志入口：
//! - 四个命名流 `debug` / `access` / `info` / `error`，各写一个滚动 JSON 文件
//! - error 流附带 caller、stacktrace、serviceName、logPath
//! - 启用 Kafka 时 error 流 (以及配置了 info_topic 的 info 流) 经过滤后转发

pub mod encoder;
pub mod error;
pub mod level;
mod logger;

pub use encoder::{JsonEncoder, ServiceFields};
pub use error::LoggerError;
pub use level::{LogLevel, Stream};
pub use logger::Logger;
