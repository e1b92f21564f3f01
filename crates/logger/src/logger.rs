//! Logger - the handle applications log through

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt::Display;
use std::fs;
use std::io::Write;
use std::panic::Location;
use std::path::Path;
use std::sync::{Arc, Mutex};

use broker::{ContentFilter, ProducerAdapter, TopicBinding};
use config_loader::ConfigValidator;
use contracts::{KafkaLoggerConfig, LoggerConfig};
use sinks::{FanOut, KafkaSink, RotatingFile, RotatingFileOptions};
use tracing::{info, instrument, warn};

use crate::encoder::{Context, JsonEncoder, ServiceFields};
use crate::error::LoggerError;
use crate::level::{LogLevel, Stream};

/// One named output: encoder plus the writer it feeds
struct StreamWriter {
    stream: Stream,
    encoder: JsonEncoder,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl StreamWriter {
    fn write(&self, msg: &str, ctx: Context<'_>) {
        let line = match self.encoder.encode(self.stream.level(), msg, ctx) {
            Ok(line) => line,
            Err(e) => {
                warn!(stream = %self.stream, error = %e, "Failed to encode log record");
                return;
            }
        };
        let mut writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writer.write_all(&line) {
            warn!(stream = %self.stream, error = %e, "Failed to write log record");
        }
    }

    fn flush(&self) {
        let mut writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writer.flush() {
            warn!(stream = %self.stream, error = %e, "Failed to flush log stream");
        }
    }
}

/// Four-stream JSON logger with optional Kafka forwarding
///
/// `debug` / `access` / `info` records are written at info level, `error`
/// records at error level, so `log_level = "error"` keeps only the error
/// stream.
pub struct Logger {
    level: LogLevel,
    debug: StreamWriter,
    access: StreamWriter,
    info: StreamWriter,
    error: StreamWriter,
    producer: Option<Arc<ProducerAdapter>>,
}

impl Logger {
    /// Validate the config, connect Kafka when enabled, open the log files
    ///
    /// # Errors
    /// - Invalid configuration
    /// - Broker unreachable (when `enable_kafka`)
    /// - Log directory not writable
    #[instrument(name = "logger_init", skip(config), fields(service = %config.base.service_name))]
    pub async fn init(config: &LoggerConfig) -> Result<Self, LoggerError> {
        ConfigValidator::validate(config)?;
        let producer = match config.active_kafka() {
            Some(kafka) => Some(Arc::new(connect(kafka).await?)),
            None => None,
        };
        Self::with_producer(config, producer)
    }

    /// Build the logger around an already started producer
    ///
    /// `None` disables forwarding regardless of `enable_kafka`.
    pub fn with_producer(
        config: &LoggerConfig,
        producer: Option<Arc<ProducerAdapter>>,
    ) -> Result<Self, LoggerError> {
        ConfigValidator::validate(config)?;

        let base = &config.base;
        let dir = Path::new(&base.log_path);
        fs::create_dir_all(dir)?;
        let options = RotatingFileOptions::from(&base.rotation);
        let open = |stream: Stream| RotatingFile::open(dir.join(stream.file_name()), options.clone());

        let kafka = config.active_kafka().filter(|_| producer.is_some());
        let filter = kafka
            .map(|k| ContentFilter::new(k.filter.iter().cloned()))
            .unwrap_or_default();

        let error_writer: Box<dyn Write + Send> = match kafka {
            Some(k) => {
                let binding = TopicBinding::new(k.error_topic.as_str(), filter.clone());
                // File first: local persistence never waits behind the broker path
                Box::new(FanOut::new(vec![
                    Box::new(open(Stream::Error)?),
                    Box::new(KafkaSink::new(producer.clone(), binding)),
                ]))
            }
            None => Box::new(open(Stream::Error)?),
        };
        let info_writer: Box<dyn Write + Send> = match kafka.and_then(|k| k.info_topic.as_deref()) {
            Some(topic) => {
                let binding = TopicBinding::new(topic, filter);
                Box::new(FanOut::new(vec![
                    Box::new(open(Stream::Info)?),
                    Box::new(KafkaSink::new(producer.clone(), binding)),
                ]))
            }
            None => Box::new(open(Stream::Info)?),
        };

        let service_fields = ServiceFields {
            service_name: base.service_name.clone(),
            log_path: base.log_path.clone(),
        };
        let level = LogLevel::from_config(&base.log_level);
        info!(
            log_path = %base.log_path,
            level = %level,
            kafka = producer.is_some(),
            "Logger initialized"
        );

        Ok(Self {
            level,
            debug: plain(Stream::Debug, Box::new(open(Stream::Debug)?)),
            access: plain(Stream::Access, Box::new(open(Stream::Access)?)),
            info: plain(Stream::Info, info_writer),
            error: StreamWriter {
                stream: Stream::Error,
                encoder: JsonEncoder::with_fields(service_fields),
                writer: Mutex::new(error_writer),
            },
            producer,
        })
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Shared producer, when forwarding is on
    pub fn producer(&self) -> Option<&Arc<ProducerAdapter>> {
        self.producer.as_ref()
    }

    pub fn enabled(&self, stream: Stream) -> bool {
        stream.level() >= self.level
    }

    pub fn debug(&self, msg: impl Display) {
        self.emit(&self.debug, msg, Context::default());
    }

    pub fn access(&self, msg: impl Display) {
        self.emit(&self.access, msg, Context::default());
    }

    pub fn info(&self, msg: impl Display) {
        self.emit(&self.info, msg, Context::default());
    }

    /// Error record with the caller location and, when captured, a backtrace
    #[track_caller]
    pub fn error(&self, msg: impl Display) {
        if !self.enabled(Stream::Error) {
            return;
        }
        let caller = Location::caller();
        let backtrace = Backtrace::force_capture();
        let stacktrace = match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };
        let ctx = Context {
            caller: Some(caller),
            stacktrace: stacktrace.as_deref(),
        };
        self.emit(&self.error, msg, ctx);
    }

    fn emit(&self, target: &StreamWriter, msg: impl Display, ctx: Context<'_>) {
        if !self.enabled(target.stream) {
            return;
        }
        target.write(&msg.to_string(), ctx);
    }

    /// Flush every stream, then drain and stop the shared producer
    #[instrument(name = "logger_shutdown", skip(self))]
    pub async fn shutdown(&self) {
        for stream in [&self.debug, &self.access, &self.info, &self.error] {
            stream.flush();
        }
        if let Some(producer) = &self.producer {
            producer.shutdown().await;
        }
        info!("Logger shut down");
    }
}

fn plain(stream: Stream, writer: Box<dyn Write + Send>) -> StreamWriter {
    StreamWriter {
        stream,
        encoder: JsonEncoder::new(),
        writer: Mutex::new(writer),
    }
}

#[cfg(feature = "kafka")]
async fn connect(kafka: &KafkaLoggerConfig) -> Result<ProducerAdapter, LoggerError> {
    Ok(ProducerAdapter::connect(&kafka.client).await?)
}

#[cfg(not(feature = "kafka"))]
async fn connect(_kafka: &KafkaLoggerConfig) -> Result<ProducerAdapter, LoggerError> {
    Err(contracts::ContractError::config_validation(
        "enable_kafka",
        "this build has no kafka support",
    )
    .into())
}
