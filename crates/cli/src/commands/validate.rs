//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    service_name: String,
    log_path: String,
    kafka_enabled: bool,
    host_count: usize,
    filter_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            let kafka = config.active_kafka();
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    service_name: config.base.service_name.clone(),
                    log_path: config.base.log_path.clone(),
                    kafka_enabled: kafka.is_some(),
                    host_count: kafka.map_or(0, |k| k.client.hosts.len()),
                    filter_count: kafka.map_or(0, |k| k.filter.len()),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &contracts::LoggerConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !matches!(config.base.log_level.as_str(), "debug" | "info" | "error") {
        warnings.push(format!(
            "base.log_level '{}' is not recognized - info will be used",
            config.base.log_level
        ));
    }

    if !config.enable_kafka && config.kafka.is_some() {
        warnings.push("kafka section present but enable_kafka is false".to_string());
    }

    if let Some(kafka) = config.active_kafka() {
        if kafka.filter.iter().any(|f| f.is_empty()) {
            warnings.push("kafka.filter contains empty entries - they never match".to_string());
        }
        if kafka.client.worker_pool.is_none() {
            warnings.push("kafka.client.worker_pool not set - using default pool settings".to_string());
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Service: {}", summary.service_name);
            println!("  Log path: {}", summary.log_path);
            println!("  Kafka: {}", if summary.kafka_enabled { "enabled" } else { "disabled" });
            println!("  Hosts: {}", summary.host_count);
            println!("  Filters: {}", summary.filter_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
