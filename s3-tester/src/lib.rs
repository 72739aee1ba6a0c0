//! Benchmarks an S3-compatible object store.
//!
//! A [`RunController`] drives a pool of virtual users for a fixed duration. Each of them repeats
//! the same cycle: upload a fresh random object under a random key, download it again, and delete
//! it. Every step is timed, and the timings are aggregated into a [`BenchmarkReport`] with latency
//! and throughput distributions per operation.
//!
//! Failed operations are counted, never retried. When more than [`ERROR_THRESHOLD`] iterations
//! have failed, the run stops early but still reports what it measured.
//!
//! The store is abstracted as a [`StorageSession`](session::StorageSession), with an S3
//! implementation for real measurements and an in-memory one for dry runs and tests.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod observability;
pub mod payload;
pub mod report;
pub mod session;
pub mod size;
mod state;
pub mod stats;
mod worker;

pub use crate::controller::{ERROR_THRESHOLD, RunConfig, RunController, RunOutcome};
pub use crate::report::BenchmarkReport;
pub use crate::state::{RunSamples, RunState};
pub use crate::worker::{WorkerState, WorkerSummary};
