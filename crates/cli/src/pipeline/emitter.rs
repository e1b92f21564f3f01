//! Emitter - feeds records into a logger stream on a blocking thread
//!
//! Logger calls may block while the dispatch queue is full, so the loop runs
//! under `spawn_blocking` and checks a stop flag between records.
//!
//! Stdin is read on its own thread. A stop request ends the emitter at once
//! even while that thread is parked in a blocking read; the reader thread is
//! left behind and goes away with the process.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use logger::{Logger, Stream};
use observability::RunningStats;
use tracing::{debug, warn};

/// Where the records come from
#[derive(Debug, Clone)]
pub enum RecordSource {
    /// `count` generated messages, `{i}` replaced by the sequence number
    Generated { count: u64, template: String },
    /// One record per line of stdin, empty lines skipped
    Stdin,
}

/// Result of one emission run
#[derive(Debug, Clone, Default)]
pub struct EmitOutcome {
    pub emitted: u64,
    /// Per-call latency of the logger in microseconds
    pub latency_us: RunningStats,
    pub interrupted: bool,
}

/// How often an idle line reader re-checks the stop flag
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Lines read ahead of the emitter
const READ_AHEAD: usize = 1024;

pub struct Emitter {
    logger: Arc<Logger>,
    stream: Stream,
    stop: Arc<AtomicBool>,
}

impl Emitter {
    pub fn new(logger: Arc<Logger>, stream: Stream) -> Self {
        Self {
            logger,
            stream,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that ends the loop after the current record
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Run to completion on the blocking pool
    pub async fn run(self, source: RecordSource) -> anyhow::Result<EmitOutcome> {
        let outcome = tokio::task::spawn_blocking(move || self.emit_all(source)).await?;
        Ok(outcome)
    }

    fn emit_all(&self, source: RecordSource) -> EmitOutcome {
        let mut outcome = EmitOutcome::default();
        match source {
            RecordSource::Generated { count, template } => {
                for i in 0..count {
                    if self.stopped(&mut outcome) {
                        break;
                    }
                    self.emit_one(&template.replace("{i}", &i.to_string()), &mut outcome);
                }
            }
            RecordSource::Stdin => {
                return self.emit_lines(std::io::BufReader::new(std::io::stdin()), outcome);
            }
        }
        debug!(emitted = outcome.emitted, "Emitter finished");
        outcome
    }

    fn emit_lines<R>(&self, reader: R, mut outcome: EmitOutcome) -> EmitOutcome
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(READ_AHEAD);
        let spawned = thread::Builder::new()
            .name("vlog-stdin".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    let stop = line.is_err();
                    if tx.send(line).is_err() || stop {
                        break;
                    }
                }
            });
        if let Err(e) = spawned {
            warn!(error = %e, "Failed to start stdin reader");
            return outcome;
        }

        loop {
            if self.stopped(&mut outcome) {
                break;
            }
            match rx.recv_timeout(STOP_POLL_INTERVAL) {
                Ok(Ok(line)) if line.trim().is_empty() => {}
                Ok(Ok(line)) => self.emit_one(line.trim_end(), &mut outcome),
                Ok(Err(e)) => {
                    warn!(error = %e, "Failed to read stdin, stopping");
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!(emitted = outcome.emitted, "Emitter finished");
        outcome
    }

    fn stopped(&self, outcome: &mut EmitOutcome) -> bool {
        if self.stop.load(Ordering::Relaxed) {
            outcome.interrupted = true;
        }
        outcome.interrupted
    }

    fn emit_one(&self, msg: &str, outcome: &mut EmitOutcome) {
        let start = Instant::now();
        match self.stream {
            Stream::Debug => self.logger.debug(msg),
            Stream::Access => self.logger.access(msg),
            Stream::Info => self.logger.info(msg),
            Stream::Error => self.logger.error(msg),
        }
        outcome
            .latency_us
            .push(start.elapsed().as_secs_f64() * 1_000_000.0);
        outcome.emitted += 1;
    }
}
