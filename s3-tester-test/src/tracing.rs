use std::env;

use s3_tester::observability::parse_rust_log;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Initialize the logger for testing.
///
/// Logs go to the output captured by the Rust test runner. Without `RUST_LOG`, everything the
/// benchmark crate emits is shown; otherwise `RUST_LOG` is interpreted the same way as by the
/// `s3-tester` binary, so `RUST_LOG=debug` or `RUST_LOG=s3=trace` narrow or widen test output.
/// Calling this more than once is harmless.
///
/// # Example
///
/// ```
/// s3_tester_test::tracing::init();
/// ```
pub fn init() {
    let rust_log = env::var(EnvFilter::DEFAULT_ENV).ok();
    let (level, env_filter) = parse_rust_log(rust_log.as_deref(), LevelFilter::TRACE);

    let format = tracing_subscriber::fmt::layer()
        .with_test_writer()
        .compact();

    tracing_subscriber::registry()
        .with(format.with_filter(level))
        .with(env_filter)
        .try_init()
        .ok();
}
