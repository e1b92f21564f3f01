//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{LoggerConfig, PoolSettings};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    base: BaseInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    kafka: Option<KafkaInfo>,
}

#[derive(Serialize)]
struct BaseInfo {
    log_path: String,
    log_level: String,
    service_name: String,
    files: Vec<String>,
    max_size_mb: u64,
    max_backups: usize,
    max_age_days: u64,
}

#[derive(Serialize)]
struct KafkaInfo {
    hosts: Vec<String>,
    error_topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    info_topic: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    filter: Vec<String>,
    pool: PoolInfo,
}

#[derive(Serialize)]
struct PoolInfo {
    name: String,
    worker_count: usize,
    queue_capacity: usize,
    idle_timeout_secs: u64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    let info = build_config_info(&config)?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &LoggerConfig) -> Result<ConfigInfo> {
    let base = &config.base;
    let kafka = match config.active_kafka() {
        Some(kafka) => {
            let pool = PoolSettings::from_config(kafka.client.worker_pool.as_ref())?;
            Some(KafkaInfo {
                hosts: kafka.client.hosts.clone(),
                error_topic: kafka.error_topic.clone(),
                info_topic: kafka.info_topic.clone(),
                filter: kafka.filter.clone(),
                pool: PoolInfo {
                    name: pool.name,
                    worker_count: pool.worker_count,
                    queue_capacity: pool.queue_capacity,
                    idle_timeout_secs: pool.idle_timeout.as_secs(),
                },
            })
        }
        None => None,
    };

    Ok(ConfigInfo {
        base: BaseInfo {
            log_path: base.log_path.clone(),
            log_level: base.log_level.clone(),
            service_name: base.service_name.clone(),
            files: logger::Stream::ALL.iter().map(|s| s.file_name()).collect(),
            max_size_mb: base.rotation.max_size_mb,
            max_backups: base.rotation.max_backups,
            max_age_days: base.rotation.max_age_days,
        },
        kafka,
    })
}

fn print_config_info(info: &ConfigInfo) {
    println!("\n=== vlog Configuration ===\n");

    println!("Base:");
    println!("  Service: {}", info.base.service_name);
    println!("  Log path: {}", info.base.log_path);
    println!("  Level: {}", info.base.log_level);
    println!("  Files: {}", info.base.files.join(", "));
    println!(
        "  Rotation: {} MB, {} backups, {} days",
        info.base.max_size_mb, info.base.max_backups, info.base.max_age_days
    );

    match &info.kafka {
        Some(kafka) => {
            println!("\nKafka:");
            println!("  Hosts: {}", kafka.hosts.join(", "));
            println!("  Error topic: {}", kafka.error_topic);
            if let Some(topic) = &kafka.info_topic {
                println!("  Info topic: {}", topic);
            }
            if !kafka.filter.is_empty() {
                println!("  Filter: {:?}", kafka.filter);
            }
            println!(
                "  Pool: {} ({} workers, queue {}, idle {}s)",
                kafka.pool.name,
                kafka.pool.worker_count,
                kafka.pool.queue_capacity,
                kafka.pool.idle_timeout_secs
            );
        }
        None => println!("\nKafka: disabled"),
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_info_resolves_pool_defaults() {
        let content = r#"{
            "enable_kafka": true,
            "base": { "log_path": "logs", "service_name": "svc" },
            "kafka": {
                "client": { "hosts": ["127.0.0.1:9092"], "worker_pool": { "worker_count": 4 } },
                "error_topic": "svc-errors"
            }
        }"#;
        let config = ConfigLoader::load_from_str(content, ConfigFormat::Json).unwrap();
        let info = build_config_info(&config).unwrap();

        let kafka = info.kafka.unwrap();
        assert_eq!(kafka.pool.worker_count, 4);
        assert_eq!(kafka.pool.queue_capacity, contracts::DEFAULT_QUEUE_CAPACITY);
        assert_eq!(info.base.files.len(), 4);
    }
}
