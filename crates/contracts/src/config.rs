//! LoggerConfig - Config Loader 输出
//!
//! 描述完整的日志配置：本地日志目录、级别、滚动策略，以及可选的 Kafka 转发。

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::WorkerPoolConfig;

/// 完整的日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoggerConfig {
    /// 是否启用 Kafka 转发
    #[serde(default)]
    pub enable_kafka: bool,

    /// 基础配置
    #[validate(nested)]
    pub base: BaseLoggerConfig,

    /// Kafka 配置 (enable_kafka = true 时必填)
    #[serde(default)]
    #[validate(nested)]
    pub kafka: Option<KafkaLoggerConfig>,
}

impl LoggerConfig {
    /// Kafka section, only when forwarding is enabled
    pub fn active_kafka(&self) -> Option<&KafkaLoggerConfig> {
        if self.enable_kafka {
            self.kafka.as_ref()
        } else {
            None
        }
    }
}

/// 基础配置：日志目录、级别、服务名
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BaseLoggerConfig {
    /// 日志目录
    #[validate(length(min = 1, message = "log_path cannot be empty"))]
    pub log_path: String,

    /// 日志级别 ("debug" / "info" / "error")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 服务名，写入 error 日志的 serviceName 字段
    #[validate(length(min = 1, message = "service_name cannot be empty"))]
    pub service_name: String,

    /// 文件滚动策略
    #[serde(default)]
    #[validate(nested)]
    pub rotation: RotationConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// 文件滚动策略
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RotationConfig {
    /// 单个文件最大大小 (MB)
    #[serde(default = "default_max_size_mb")]
    #[validate(range(min = 1, message = "max_size_mb must be >= 1"))]
    pub max_size_mb: u64,

    /// 最多保留的备份文件数 (0 = 不限制)
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,

    /// 备份文件最长保留天数 (0 = 不限制)
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u64,

    /// 备份文件名使用本地时间 (默认 UTC)
    #[serde(default)]
    pub local_time: bool,
}

fn default_max_size_mb() -> u64 {
    500
}

fn default_max_backups() -> usize {
    15
}

fn default_max_age_days() -> u64 {
    7
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_size_mb: default_max_size_mb(),
            max_backups: default_max_backups(),
            max_age_days: default_max_age_days(),
            local_time: false,
        }
    }
}

/// Kafka 转发配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct KafkaLoggerConfig {
    /// Kafka 客户端配置
    #[validate(nested)]
    pub client: KafkaClientConfig,

    /// info 流的 topic (可选)
    #[serde(default)]
    pub info_topic: Option<String>,

    /// error 流的 topic
    #[validate(length(min = 1, message = "error_topic cannot be empty"))]
    pub error_topic: String,

    /// 过滤列表：命中的 msg 不转发
    #[serde(default)]
    pub filter: Vec<String>,
}

/// Kafka 客户端配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct KafkaClientConfig {
    /// Broker 地址列表 ("host:port")
    #[validate(length(min = 1, message = "at least one broker host is required"))]
    pub hosts: Vec<String>,

    /// 工作线程池配置 (缺省时使用默认值)
    #[serde(default, alias = "workerpool")]
    pub worker_pool: Option<WorkerPoolConfig>,
}
