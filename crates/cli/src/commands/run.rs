//! `run` command implementation.

use anyhow::{Context, Result};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Emitter, RecordSource, RunStats};
use logger::Logger;

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.no_kafka && config.enable_kafka {
        info!("Kafka forwarding disabled from CLI");
        config.enable_kafka = false;
    }

    info!(
        log_path = %config.base.log_path,
        log_level = %config.base.log_level,
        service = %config.base.service_name,
        kafka = config.enable_kafka,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let logger = Arc::new(Logger::init(&config).await.map_err(CliError::from)?);
    let emitter = Emitter::new(Arc::clone(&logger), args.stream.into());
    let stop = emitter.stop_flag();

    let source = if args.count > 0 {
        RecordSource::Generated {
            count: args.count,
            template: args.message.clone(),
        }
    } else {
        info!("Reading records from stdin");
        RecordSource::Stdin
    };

    let started = Instant::now();
    let emitting = emitter.run(source);
    tokio::pin!(emitting);

    let outcome = tokio::select! {
        result = &mut emitting => result,
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping emitter...");
            stop.store(true, Ordering::Relaxed);
            emitting.await
        }
    }
    .map_err(|e| CliError::emitter(e.to_string()))?;

    logger.shutdown().await;

    let stats = RunStats {
        emitted: outcome.emitted,
        duration: started.elapsed(),
        latency_us: outcome.latency_us,
        producer: logger.producer().map(|p| p.metrics()),
        pool: logger.producer().map(|p| p.pool_metrics()),
    };
    info!(
        emitted = stats.emitted,
        interrupted = outcome.interrupted,
        duration_secs = stats.duration.as_secs_f64(),
        rate = format!("{:.2}", stats.rate()),
        "Run completed"
    );
    stats.print_summary();

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &contracts::LoggerConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Base:");
    println!("  Log path: {}", config.base.log_path);
    println!("  Level: {}", config.base.log_level);
    println!("  Service: {}", config.base.service_name);

    match config.active_kafka() {
        Some(kafka) => {
            println!("\nKafka:");
            println!("  Hosts: {}", kafka.client.hosts.join(", "));
            println!("  Error topic: {}", kafka.error_topic);
            if let Some(topic) = &kafka.info_topic {
                println!("  Info topic: {}", topic);
            }
            if !kafka.filter.is_empty() {
                println!("  Filter: {:?}", kafka.filter);
            }
        }
        None => println!("\nKafka: disabled"),
    }

    println!();
}
