//! State shared between the workers and the controller of a run.
//!
//! Everything that is mutated concurrently lives behind a single mutex: the run counters and the
//! stop flag in [`RunState`], and the sample sets in [`RunSamples`]. Workers take the lock once per
//! recorded sample and once at the end of every iteration, which is rare compared to the cost of a
//! network round trip.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::session::Operation;
use crate::stats::SampleSet;

/// Counters and the stop flag of a run.
///
/// Both counters only ever grow while the run is active.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RunState {
    /// Set by the controller once workers must stop after their current iteration.
    pub stop_requested: bool,
    /// Number of put, get and delete cycles that succeeded as a whole.
    pub completed_iterations: u64,
    /// Number of failed iterations.
    pub error_count: u64,
}

/// Samples collected during a run.
#[derive(Clone, Debug, Default)]
pub struct RunSamples {
    /// Upload latency in milliseconds.
    pub upload_latency: SampleSet,
    /// Upload throughput in bytes per second.
    pub upload_throughput: SampleSet,
    /// Download latency in milliseconds.
    pub download_latency: SampleSet,
    /// Download throughput in bytes per second.
    pub download_throughput: SampleSet,
    /// Delete latency in milliseconds.
    pub delete_latency: SampleSet,
}

impl RunSamples {
    pub(crate) fn latency_mut(&mut self, operation: Operation) -> &mut SampleSet {
        match operation {
            Operation::Upload => &mut self.upload_latency,
            Operation::Download => &mut self.download_latency,
            Operation::Delete => &mut self.delete_latency,
        }
    }

    /// Deletes transfer no payload, so they have no throughput.
    pub(crate) fn throughput_mut(&mut self, operation: Operation) -> Option<&mut SampleSet> {
        match operation {
            Operation::Upload => Some(&mut self.upload_throughput),
            Operation::Download => Some(&mut self.download_throughput),
            Operation::Delete => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Shared {
    pub state: RunState,
    pub samples: RunSamples,
}

/// Handle to the lock guarding all cross-task state of a run.
#[derive(Clone, Debug, Default)]
pub(crate) struct SharedState(Arc<Mutex<Shared>>);

impl SharedState {
    /// Locks the shared state.
    ///
    /// A worker that panicked while holding the lock cannot leave the counters or samples half
    /// written, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, Shared> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of the current counters.
    pub fn snapshot(&self) -> RunState {
        self.lock().state
    }

    /// Requests all workers to stop after their current iteration.
    pub fn request_stop(&self) {
        self.lock().state.stop_requested = true;
    }

    /// Takes the final state out once all workers have been joined.
    pub fn into_inner(self) -> Shared {
        match Arc::try_unwrap(self.0) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
            // Only reachable if a handle outlives the workers; copy rather than fail the report.
            Err(shared) => {
                let copy = shared.lock().unwrap_or_else(PoisonError::into_inner).clone();
                copy
            }
        }
    }
}
