//! Logging setup for the command line tool.

use std::env;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Maximum verbosity per crate, further restricted by the selected level.
const DEFAULT_DIRECTIVES: &str = "WARN,s3_tester=TRACE";

/// Installs the global tracing subscriber writing to stderr.
///
/// `level` applies unless `RUST_LOG` is set, see [`parse_rust_log`].
pub fn init_tracing(level: LevelFilter) {
    let rust_log = env::var(EnvFilter::DEFAULT_ENV).ok();
    let (level, env_filter) = parse_rust_log(rust_log.as_deref(), level);

    let format = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(format.with_filter(level))
        .with(env_filter)
        .init();
}

/// Resolves the effective level and filter from the value of `RUST_LOG`.
///
/// A plain level such as `debug` replaces `default`. Anything else is used literally as a filter,
/// for users who know which overrides they want.
pub fn parse_rust_log(rust_log: Option<&str>, default: LevelFilter) -> (LevelFilter, EnvFilter) {
    let level = match rust_log.filter(|value| !value.is_empty()) {
        Some(value) => match value.parse::<LevelFilter>() {
            Ok(level) => level,
            Err(_) => return (LevelFilter::TRACE, EnvFilter::new(value)),
        },
        None => default,
    };

    (level, EnvFilter::new(DEFAULT_DIRECTIVES))
}
