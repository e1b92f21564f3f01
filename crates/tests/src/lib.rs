//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（无需 Kafka，使用 MockTransport）
//! - 并发与背压行为

#[cfg(test)]
mod contract_tests {
    use contracts::{PoolSettings, DEFAULT_POOL_NAME, MIN_QUEUE_CAPACITY};

    #[test]
    fn test_pool_defaults_are_valid_pool_settings() {
        let settings = PoolSettings::default();
        assert_eq!(settings.name, DEFAULT_POOL_NAME);
        assert!(settings.queue_capacity >= MIN_QUEUE_CAPACITY);
        assert!(settings.worker_count > 0);
    }

    #[test]
    fn test_minimal_config_takes_defaults() {
        let json = r#"{"base": {"log_path": "/tmp/vlog", "service_name": "svc"}}"#;
        let config = config_loader::ConfigLoader::load_from_str(
            json,
            config_loader::ConfigFormat::Json,
        )
        .unwrap();

        assert!(!config.enable_kafka);
        assert!(config.active_kafka().is_none());
        assert_eq!(config.base.log_level, "info");
        assert_eq!(config.base.rotation.max_backups, 15);
        assert_eq!(
            PoolSettings::from_config(None).unwrap(),
            PoolSettings::default()
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use broker::mock::MockTransport;
    use broker::{ProducerAdapter, ProducerSettings, TopicBinding};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::PoolSettings;
    use logger::{Logger, Stream};
    use serde_json::Value;
    use sinks::KafkaSink;
    use tempfile::TempDir;

    fn config_toml(dir: &TempDir, level: &str) -> String {
        format!(
            r#"
enable_kafka = true

[base]
log_path = "{}"
log_level = "{level}"
service_name = "e2e"

[kafka]
error_topic = "e2e-errors"
info_topic = "e2e-info"
filter = ["heartbeat"]

[kafka.client]
hosts = ["127.0.0.1:9092"]

[kafka.client.worker_pool]
worker_count = 2
queue_capacity = 100
idle_timeout_secs = 1
"#,
            dir.path().join("logs").display()
        )
    }

    fn start_adapter(
        config: &contracts::LoggerConfig,
        transport: Arc<MockTransport>,
    ) -> Arc<ProducerAdapter> {
        let kafka = config.active_kafka().unwrap();
        let pool = PoolSettings::from_config(kafka.client.worker_pool.as_ref()).unwrap();
        Arc::new(ProducerAdapter::init(transport, pool, ProducerSettings::default()).unwrap())
    }

    /// End-to-end: config file -> Logger -> worker pool -> filter -> producer -> transport
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_e2e_logger_to_mock_broker() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_from_str(&config_toml(&dir, "info"), ConfigFormat::Toml)
            .unwrap();
        let transport = Arc::new(MockTransport::new());
        let adapter = start_adapter(&config, Arc::clone(&transport));
        let logger = Arc::new(Logger::with_producer(&config, Some(adapter)).unwrap());

        // Emit from several OS threads at once
        let mut handles = Vec::new();
        for t in 0..8 {
            let logger = Arc::clone(&logger);
            handles.push(tokio::task::spawn_blocking(move || {
                for i in 0..50 {
                    if i % 10 == 0 {
                        logger.error("heartbeat");
                    } else {
                        logger.error(format_args!("thread {t} event {i}"));
                    }
                    logger.info(format_args!("thread {t} info {i}"));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        logger.shutdown().await;

        let errors = transport.delivered_to("e2e-errors");
        assert_eq!(errors.len(), 8 * 45);
        for record in &errors {
            let value: Value = serde_json::from_slice(record.trim_ascii_end()).unwrap();
            assert_ne!(value["msg"], "heartbeat");
            assert_eq!(value["serviceName"], "e2e");
        }
        assert_eq!(transport.delivered_to("e2e-info").len(), 8 * 50);

        let producer = logger.producer().unwrap();
        let pool = producer.pool_metrics();
        assert!(pool.peak_active <= 2, "peak_active = {}", pool.peak_active);
        assert_eq!(pool.submitted, pool.completed);
        assert_eq!(producer.metrics().suppressed, 8 * 5);

        // Local files keep every record, filtered or not
        let error_log =
            std::fs::read_to_string(dir.path().join("logs").join(Stream::Error.file_name()))
                .unwrap();
        assert_eq!(error_log.lines().count(), 8 * 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_error_level_forwards_only_errors() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_from_str(&config_toml(&dir, "error"), ConfigFormat::Toml)
            .unwrap();
        let transport = Arc::new(MockTransport::new());
        let adapter = start_adapter(&config, Arc::clone(&transport));
        let logger = Logger::with_producer(&config, Some(adapter)).unwrap();

        logger.info("silenced");
        logger.error("disk full");
        logger.shutdown().await;

        assert!(transport.delivered_to("e2e-info").is_empty());
        assert_eq!(transport.delivered_to("e2e-errors").len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_broker_failures_never_reach_the_caller() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_from_str(&config_toml(&dir, "info"), ConfigFormat::Toml)
            .unwrap();
        let transport = Arc::new(MockTransport::new().failing_topic("e2e-errors"));
        let adapter = start_adapter(&config, Arc::clone(&transport));

        let mut sink = KafkaSink::new(
            Some(Arc::clone(&adapter)),
            TopicBinding::unfiltered("e2e-errors"),
        );
        for i in 0..20 {
            let line = format!("{{\"msg\":\"failure {i}\"}}\n");
            assert_eq!(sink.write(line.as_bytes()).unwrap(), line.len());
        }
        adapter.shutdown().await;

        let snapshot = adapter.metrics();
        assert_eq!(snapshot.failed, 20);
        assert_eq!(snapshot.delivered, 0);
        assert_eq!(transport.delivered_count(), 0);
    }

    #[test]
    fn test_e2e_disabled_forwarding_has_no_side_effects() {
        // No runtime: without a producer nothing may need one
        let dir = TempDir::new().unwrap();
        let mut config = ConfigLoader::load_from_str(&config_toml(&dir, "info"), ConfigFormat::Toml)
            .unwrap();
        config.enable_kafka = false;

        let logger = Logger::with_producer(&config, None).unwrap();
        logger.error("kept locally");

        let mut sink = KafkaSink::disabled(TopicBinding::unfiltered("e2e-errors"));
        assert_eq!(sink.write(b"payload").unwrap(), 7);
        assert!(logger.producer().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_idle_workers_are_reclaimed_and_recreated() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_from_str(&config_toml(&dir, "info"), ConfigFormat::Toml)
            .unwrap();
        let transport = Arc::new(MockTransport::new());
        let adapter = start_adapter(&config, Arc::clone(&transport));

        adapter.send("e2e-info", bytes::Bytes::from_static(b"{\"msg\":\"a\"}")).unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        adapter.send("e2e-info", bytes::Bytes::from_static(b"{\"msg\":\"b\"}")).unwrap();
        adapter.shutdown().await;

        assert_eq!(transport.delivered_to("e2e-info").len(), 2);
        assert!(adapter.pool_metrics().reclaimed_workers >= 1);
    }
}

#[cfg(test)]
mod concurrency_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::PoolSettings;
    use dispatcher::{DispatcherError, WorkerPool};

    fn settings(worker_count: usize, queue_capacity: usize) -> PoolSettings {
        PoolSettings {
            name: "concurrency-pool".to_string(),
            worker_count,
            queue_capacity,
            idle_timeout: Duration::from_secs(4),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_submitters_run_every_task_once() {
        let pool = Arc::new(WorkerPool::start(settings(3, 100)).unwrap());
        let ran = Arc::new(AtomicUsize::new(0));

        let mut submitters = Vec::new();
        for _ in 0..10 {
            let pool = Arc::clone(&pool);
            let ran = Arc::clone(&ran);
            submitters.push(tokio::task::spawn_blocking(move || {
                for _ in 0..200 {
                    let ran = Arc::clone(&ran);
                    pool.submit(async move {
                        ran.fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap();
                }
            }));
        }
        for submitter in submitters {
            submitter.await.unwrap();
        }
        pool.shutdown().await;

        assert_eq!(ran.load(Ordering::SeqCst), 2000);
        let snapshot = pool.snapshot();
        assert_eq!(snapshot.completed, 2000);
        assert!(snapshot.peak_active <= 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panicking_tasks_do_not_stop_the_pool() {
        let pool = WorkerPool::start(settings(2, 100)).unwrap();
        let ran = Arc::new(AtomicUsize::new(0));

        for i in 0..20 {
            let ran = Arc::clone(&ran);
            pool.submit(async move {
                if i % 4 == 0 {
                    panic!("task {i} failed");
                }
                ran.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.shutdown().await;

        assert_eq!(ran.load(Ordering::SeqCst), 15);
        assert_eq!(pool.snapshot().panicked, 5);
        assert!(matches!(
            pool.submit(async {}),
            Err(DispatcherError::Closed { .. })
        ));
    }
}
