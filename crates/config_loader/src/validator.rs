//! 配置校验模块
//!
//! 校验规则：
//! - 字段级规则来自 `validator` derive (非空、范围)
//! - enable_kafka = true 时必须有 kafka 段
//! - broker 地址为 "host:port"
//! - info_topic 设置时不能为空
//! - worker_pool 数值合法 (不能为负、不能为 0、队列容量 >= 100)

use contracts::{ContractError, KafkaLoggerConfig, LoggerConfig, PoolSettings};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// LoggerConfig 校验器
pub struct ConfigValidator;

impl ConfigValidator {
    /// 校验完整配置
    ///
    /// 返回第一个遇到的错误，或 Ok(())。
    pub fn validate(config: &LoggerConfig) -> Result<(), ContractError> {
        validate_fields(config)?;
        validate_kafka_required(config)?;
        if let Some(kafka) = &config.kafka {
            validate_hosts(kafka)?;
            validate_topics(kafka)?;
            validate_worker_pool(kafka)?;
        }
        Ok(())
    }
}

/// 字段级规则 (derive)
fn validate_fields(config: &LoggerConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let (field, message) = first_error("", &errors)
            .unwrap_or_else(|| (String::new(), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

/// 按字段名排序后取第一个错误，路径形如 `kafka.client.hosts`
fn first_error(prefix: &str, errors: &ValidationErrors) -> Option<(String, String)> {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in entries {
        let path = format!("{prefix}{field}");
        let found = match kind {
            ValidationErrorsKind::Field(list) => list.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                (path.clone(), message)
            }),
            ValidationErrorsKind::Struct(nested) => first_error(&format!("{path}."), nested),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(index, nested)| first_error(&format!("{path}[{index}]."), nested)),
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

/// 启用 Kafka 时必须提供 kafka 段
fn validate_kafka_required(config: &LoggerConfig) -> Result<(), ContractError> {
    if config.enable_kafka && config.kafka.is_none() {
        return Err(ContractError::config_validation(
            "kafka",
            "kafka section is required when enable_kafka is true",
        ));
    }
    Ok(())
}

/// 校验 broker 地址
fn validate_hosts(kafka: &KafkaLoggerConfig) -> Result<(), ContractError> {
    for (i, host) in kafka.client.hosts.iter().enumerate() {
        let field = format!("kafka.client.hosts[{i}]");
        let Some((name, port)) = host.trim().rsplit_once(':') else {
            return Err(ContractError::config_validation(
                field,
                format!("expected \"host:port\", got \"{host}\""),
            ));
        };
        if name.is_empty() || port.parse::<u16>().is_err() {
            return Err(ContractError::config_validation(
                field,
                format!("expected \"host:port\", got \"{host}\""),
            ));
        }
    }
    Ok(())
}

/// 校验 topic
fn validate_topics(kafka: &KafkaLoggerConfig) -> Result<(), ContractError> {
    if kafka.error_topic.trim().is_empty() {
        return Err(ContractError::config_validation(
            "kafka.error_topic",
            "error_topic cannot be empty",
        ));
    }
    if kafka.info_topic.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ContractError::config_validation(
            "kafka.info_topic",
            "info_topic cannot be empty when set",
        ));
    }
    Ok(())
}

/// 校验工作池配置
fn validate_worker_pool(kafka: &KafkaLoggerConfig) -> Result<(), ContractError> {
    PoolSettings::from_config(kafka.client.worker_pool.as_ref())
        .map(|_| ())
        .map_err(|e| match e {
            ContractError::ConfigValidation { field, message } => {
                ContractError::config_validation(format!("kafka.client.{field}"), message)
            }
            other => other,
        })
}
