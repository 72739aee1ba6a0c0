//! A single virtual user.
//!
//! A [`Worker`] repeats one iteration after another until the controller requests a stop. Each
//! iteration uploads a fresh random object under a fresh random key, downloads it again and then
//! deletes it. The first failing step aborts the iteration, so a download or delete is never
//! attempted for an object that was not written.

use std::time::Duration;

use bytes::Bytes;
use uuid::Uuid;

use crate::payload::PayloadGenerator;
use crate::session::{Operation, SharedSession, TransferError};
use crate::state::SharedState;

/// Lifecycle of a [`Worker`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WorkerState {
    /// Executing iterations.
    Running,
    /// Observed the stop request and is leaving its loop.
    Stopping,
    /// Exited; no further samples will be recorded.
    Done,
}

/// What a worker did during the run, returned once it is [`Done`](WorkerState::Done).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WorkerSummary {
    /// Index of the worker within the pool.
    pub id: usize,
    /// Iterations that completed all three steps.
    pub iterations: u64,
    /// Iterations that were aborted by a failed step.
    pub errors: u64,
    /// Final state, always [`WorkerState::Done`].
    pub state: WorkerState,
}

/// A failed step, with the context needed to log it.
#[derive(Debug)]
struct StepError {
    operation: Operation,
    key: String,
    error: TransferError,
}

/// A virtual user executing put, get and delete cycles against a session.
#[derive(Debug)]
pub(crate) struct Worker {
    id: usize,
    session: SharedSession,
    payloads: PayloadGenerator,
    shared: SharedState,
    state: WorkerState,
    iterations: u64,
    errors: u64,
}

impl Worker {
    pub fn new(
        id: usize,
        session: SharedSession,
        payloads: PayloadGenerator,
        shared: SharedState,
    ) -> Self {
        Self {
            id,
            session,
            payloads,
            shared,
            state: WorkerState::Running,
            iterations: 0,
            errors: 0,
        }
    }

    /// Runs iterations until a stop is requested.
    ///
    /// The stop flag is only checked between iterations, in the same critical section that
    /// accounts the finished iteration. Once this returns, the worker holds no reference to the
    /// shared state anymore.
    pub async fn run(mut self) -> WorkerSummary {
        while self.state == WorkerState::Running {
            tracing::trace!("starting iteration for worker {}", self.id);
            let result = self.iterate().await;
            tracing::trace!("finished iteration for worker {}", self.id);

            if let Err(StepError {
                operation,
                key,
                error,
            }) = &result
            {
                tracing::error!(
                    error = error as &dyn std::error::Error,
                    "failed to {operation} object '{key}'"
                );
            }

            let succeeded = result.is_ok();
            let stop_requested = {
                let mut shared = self.shared.lock();
                if succeeded {
                    shared.state.completed_iterations += 1;
                } else {
                    shared.state.error_count += 1;
                }
                shared.state.stop_requested
            };

            if succeeded {
                self.iterations += 1;
            } else {
                self.errors += 1;
            }

            if stop_requested {
                self.state = WorkerState::Stopping;
            } else {
                // Sessions that never suspend must not starve the controller.
                tokio::task::yield_now().await;
            }
        }

        tracing::debug!(
            "worker {} stopping after {} iterations",
            self.id,
            self.iterations
        );
        self.state = WorkerState::Done;

        WorkerSummary {
            id: self.id,
            iterations: self.iterations,
            errors: self.errors,
            state: self.state,
        }
    }

    async fn iterate(&self) -> Result<(), StepError> {
        let key = Uuid::new_v4().to_string();
        let fail = |operation, error| StepError {
            operation,
            key: key.clone(),
            error,
        };

        let payload = self
            .payloads
            .generate()
            .map_err(|e| fail(Operation::Upload, e))?;
        let size = payload.len();

        let elapsed = self
            .session
            .put(&key, payload.clone())
            .await
            .map_err(|e| fail(Operation::Upload, e))?;
        self.record(Operation::Upload, size, elapsed);

        let (body, elapsed) = self
            .session
            .get(&key)
            .await
            .map_err(|e| fail(Operation::Download, e))?;
        verify(&key, &payload, &body).map_err(|e| fail(Operation::Download, e))?;
        self.record(Operation::Download, size, elapsed);

        let elapsed = self
            .session
            .delete(&key)
            .await
            .map_err(|e| fail(Operation::Delete, e))?;
        self.record(Operation::Delete, size, elapsed);

        Ok(())
    }

    /// Records the latency and, where tracked, the throughput of a successful step.
    fn record(&self, operation: Operation, size: usize, elapsed: Duration) {
        let mut shared = self.shared.lock();
        let samples = &mut shared.samples;

        samples
            .latency_mut(operation)
            .append(elapsed.as_secs_f64() * 1000.0);
        if let Some(throughput) = samples.throughput_mut(operation)
            && !elapsed.is_zero()
        {
            throughput.append(size as f64 / elapsed.as_secs_f64());
        }
    }
}

fn verify(key: &str, expected: &Bytes, actual: &Bytes) -> Result<(), TransferError> {
    if expected == actual {
        return Ok(());
    }
    Err(TransferError::ContentMismatch {
        key: key.to_owned(),
        expected: expected.len(),
        actual: actual.len(),
    })
}
