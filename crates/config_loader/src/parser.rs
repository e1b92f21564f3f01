//! 配置解析模块
//!
//! 支持 TOML、JSON 和 YAML 格式。YAML 兼容旧版 vlog 配置文件。

use contracts::{ContractError, LoggerConfig};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
    /// YAML 格式 (旧版配置)
    Yaml,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<LoggerConfig, ContractError> {
    match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| ContractError::ConfigParse {
            message: format!("TOML parse error: {e}"),
            source: Some(Box::new(e)),
        }),
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
            message: format!("JSON parse error: {e}"),
            source: Some(Box::new(e)),
        }),
        ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| ContractError::ConfigParse {
            message: format!("YAML parse error: {e}"),
            source: Some(Box::new(e)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_with_pool_aliases() {
        let content = r#"
enable_kafka = true

[base]
log_path = "/var/log/svc"
service_name = "svc"

[kafka]
error_topic = "svc-errors"
filter = ["heartbeat"]

[kafka.client]
hosts = ["10.0.0.1:9092"]

[kafka.client.worker_pool]
worker_size = 8
pool_size = 2048
timeout = 10
"#;
        let config = parse(content, ConfigFormat::Toml).unwrap();
        let pool = config.kafka.unwrap().client.worker_pool.unwrap();
        assert_eq!(pool.worker_count, Some(8));
        assert_eq!(pool.queue_capacity, Some(2048));
        assert_eq!(pool.idle_timeout_secs, Some(10));
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{ "base": { "log_path": "logs", "service_name": "svc" } }"#;
        let config = parse(content, ConfigFormat::Json).unwrap();
        assert_eq!(config.base.log_path, "logs");
        assert!(!config.enable_kafka);
    }

    #[test]
    fn test_parse_legacy_yaml() {
        // Keys as written by existing vlog deployments
        let content = r#"
enable_kafka: true
base:
  log_path: /data/logs/order
  log_level: info
  service_name: order
  caller_skip: 1
kafka:
  info_topic: order-info
  error_topic: order-errors
  filter:
    - heartbeat
    - "[ping]"
  client:
    hosts:
      - 10.0.0.1:9092
      - 10.0.0.2:9092
    workerpool:
      name: order-pool
      workersize: 8
      poolsize: 4096
      timeout: 6
"#;
        let config = parse(content, ConfigFormat::Yaml).unwrap();
        assert!(config.enable_kafka);
        assert_eq!(config.base.log_path, "/data/logs/order");
        assert_eq!(config.base.service_name, "order");

        let kafka = config.kafka.unwrap();
        assert_eq!(kafka.error_topic, "order-errors");
        assert_eq!(kafka.info_topic.as_deref(), Some("order-info"));
        assert_eq!(kafka.filter, vec!["heartbeat", "[ping]"]);
        assert_eq!(kafka.client.hosts.len(), 2);

        let pool = kafka.client.worker_pool.unwrap();
        assert_eq!(pool.name.as_deref(), Some("order-pool"));
        assert_eq!(pool.worker_count, Some(8));
        assert_eq!(pool.queue_capacity, Some(4096));
        assert_eq!(pool.idle_timeout_secs, Some(6));
    }

    #[test]
    fn test_parse_yaml_syntax_error() {
        let result = parse("base: [unclosed", ConfigFormat::Yaml);
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let result = parse("invalid toml [[[", ConfigFormat::Toml);
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }

    #[test]
    fn test_missing_required_field_is_parse_error() {
        let content = r#"{ "base": { "log_path": "logs" } }"#;
        let err = parse(content, ConfigFormat::Json).unwrap_err();
        assert!(err.to_string().contains("service_name"), "got: {err}");
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("yml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("ini"), None);
    }
}
