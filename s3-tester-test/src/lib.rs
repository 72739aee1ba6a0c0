//! Test utilities for the S3 benchmark.
//!
//! This crate provides utilities to facilitate testing of benchmark runs without a real object
//! store. See the modules for all available utilities.

pub mod session;
pub mod tracing;
