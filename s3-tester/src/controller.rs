//! Time-boxed benchmark runs.
//!
//! The [`RunController`] spawns one [`Worker`] per virtual user and then watches the run at a
//! one second resolution. The run ends when the configured duration has elapsed or when more than
//! [`ERROR_THRESHOLD`] iterations have failed. Either way, workers are asked to stop and are joined
//! before any sample is read, so the resulting [`BenchmarkReport`] is built from frozen data.

use std::time::{Duration, Instant};

use bytesize::ByteSize;
use futures::future::join_all;
use indicatif::ProgressBar;
use tokio::time::MissedTickBehavior;

use crate::error::{ConfigError, ConfigResult};
use crate::payload::PayloadGenerator;
use crate::report::BenchmarkReport;
use crate::session::SharedSession;
use crate::size::HumanSize;
use crate::state::{Shared, SharedState};
use crate::worker::Worker;

/// Number of failed iterations a run tolerates before it is cut short.
pub const ERROR_THRESHOLD: u64 = 100;

/// Resolution of the duration clock, the breaker and progress updates.
const TICK: Duration = Duration::from_secs(1);

/// Validated parameters of a benchmark run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RunConfig {
    concurrency: usize,
    duration_secs: u64,
    payload_size: ByteSize,
}

impl RunConfig {
    /// Number of virtual users used when none is configured.
    pub const DEFAULT_CONCURRENCY: usize = 1;
    /// Run duration in seconds used when none is configured.
    pub const DEFAULT_DURATION_SECS: u64 = 30;
    /// Object size used when none is configured.
    pub const DEFAULT_PAYLOAD_SIZE: ByteSize = ByteSize::kib(500);

    /// Validates and creates a run configuration.
    pub fn new(concurrency: usize, duration_secs: u64, payload_size: ByteSize) -> ConfigResult<Self> {
        if concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(concurrency));
        }
        if duration_secs == 0 {
            return Err(ConfigError::InvalidDuration(duration_secs));
        }
        if usize::try_from(payload_size.as_u64()).is_err() {
            return Err(ConfigError::PayloadTooLarge(payload_size.as_u64()));
        }

        Ok(Self {
            concurrency,
            duration_secs,
            payload_size,
        })
    }

    /// Number of workers running in parallel.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Nominal run duration in seconds.
    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    /// Size of every uploaded object.
    pub fn payload_size(&self) -> ByteSize {
        self.payload_size
    }

    fn payload_len(&self) -> usize {
        // Checked to fit in `new`.
        self.payload_size.as_u64() as usize
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: Self::DEFAULT_CONCURRENCY,
            duration_secs: Self::DEFAULT_DURATION_SECS,
            payload_size: Self::DEFAULT_PAYLOAD_SIZE,
        }
    }
}

/// How a run ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunOutcome {
    /// The configured duration elapsed.
    Completed,
    /// More than [`ERROR_THRESHOLD`] iterations failed and the run was cut short.
    BreakerTripped,
}

/// Drives a pool of workers against a session for a bounded duration.
#[derive(Debug)]
pub struct RunController {
    config: RunConfig,
    session: SharedSession,
    progress: ProgressBar,
}

impl RunController {
    /// Creates a controller without a visible progress indicator.
    pub fn new(config: RunConfig, session: SharedSession) -> Self {
        Self {
            config,
            session,
            progress: ProgressBar::hidden(),
        }
    }

    /// Advances `progress` by the number of completed iterations once per second.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Runs the benchmark to completion and returns its report.
    ///
    /// Failed operations never surface as errors here, they are only counted. A run cut short by
    /// the error breaker still yields a report from the samples collected so far.
    pub async fn run(self) -> BenchmarkReport {
        let config = self.config;
        tracing::info!(
            "Starting performance test with {} virtual users for {} seconds and a random file of {} against {}",
            config.concurrency,
            config.duration_secs,
            HumanSize(config.payload_size),
            self.session.name(),
        );

        let shared = SharedState::default();
        let payloads = PayloadGenerator::new(config.payload_len());
        let start = Instant::now();

        let workers: Vec<_> = (0..config.concurrency)
            .map(|id| {
                let worker = Worker::new(id, self.session.clone(), payloads, shared.clone());
                tokio::spawn(worker.run())
            })
            .collect();

        let outcome = self.watch(&shared).await;

        tracing::info!("Finalizing current worker jobs");
        shared.request_stop();

        for result in join_all(workers).await {
            match result {
                Ok(summary) => tracing::debug!(
                    "worker {} done: {} iterations, {} errors",
                    summary.id,
                    summary.iterations,
                    summary.errors
                ),
                Err(error) => tracing::error!(
                    error = &error as &dyn std::error::Error,
                    "worker terminated abnormally"
                ),
            }
        }

        let elapsed = start.elapsed();
        let Shared { state, samples } = shared.into_inner();
        self.progress.set_position(state.completed_iterations);
        self.progress.finish_and_clear();
        tracing::info!("Performance test finished");

        BenchmarkReport {
            config,
            samples,
            completed_iterations: state.completed_iterations,
            error_count: state.error_count,
            outcome,
            elapsed,
        }
    }

    /// Ticks once per second until the duration is exhausted or the breaker trips.
    async fn watch(&self, shared: &SharedState) -> RunOutcome {
        let mut ticker = tokio::time::interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        let mut reported = 0;
        for _ in 0..self.config.duration_secs {
            let state = shared.snapshot();
            self.progress.inc(state.completed_iterations - reported);
            reported = state.completed_iterations;

            if state.error_count > ERROR_THRESHOLD {
                tracing::error!(
                    "Too many errors ({}), stopping performance test",
                    state.error_count
                );
                return RunOutcome::BreakerTripped;
            }

            ticker.tick().await;
        }

        RunOutcome::Completed
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::session::InMemorySession;

    #[test]
    fn rejects_invalid_config() {
        assert!(matches!(
            RunConfig::new(0, 30, ByteSize::kib(1)),
            Err(ConfigError::InvalidConcurrency(0))
        ));
        assert!(matches!(
            RunConfig::new(1, 0, ByteSize::kib(1)),
            Err(ConfigError::InvalidDuration(0))
        ));
        assert!(RunConfig::new(1, 1, ByteSize::b(0)).is_ok());
    }

    #[test]
    fn default_config() {
        let config = RunConfig::default();

        assert_eq!(config.concurrency(), 1);
        assert_eq!(config.duration_secs(), 30);
        assert_eq!(config.payload_size().as_u64(), 512_000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn short_run_against_memory() {
        let session = InMemorySession::new();
        let config = RunConfig::new(2, 1, ByteSize::kib(1)).unwrap();

        let report = RunController::new(config, Arc::new(session.clone()))
            .run()
            .await;

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.error_count, 0);
        assert!(report.completed_iterations > 0);
        assert_eq!(
            report.samples.delete_latency.len() as u64,
            report.completed_iterations
        );
        assert!(report.elapsed >= Duration::from_secs(1));
        assert!(session.is_empty());
    }
}
