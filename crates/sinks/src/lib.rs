//! # Sinks
//!
//! 日志输出端，全部实现 `std::io::Write`：
//! - `KafkaSink`: 把编码后的记录交给 `ProducerAdapter`，从不等待 broker 确认
//! - `RotatingFile`: 按大小滚动、按数量/天数清理备份的本地文件
//! - `FanOut`: 同一份数据写入多个下游

pub mod fanout;
pub mod kafka;
pub mod rotating;

pub use fanout::FanOut;
pub use kafka::KafkaSink;
pub use rotating::{RotatingFile, RotatingFileOptions};
