//! Error types of the benchmark setup.

use thiserror::Error;

/// Errors that reject a benchmark before any worker starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A byte-size string could not be parsed.
    #[error("invalid size '{input}': {reason}")]
    InvalidSize {
        /// The rejected input.
        input: String,
        /// Why the input was rejected.
        reason: &'static str,
    },

    /// The number of virtual users must be at least one.
    #[error("concurrency must be at least 1, got {0}")]
    InvalidConcurrency(usize),

    /// The run duration must be at least one second.
    #[error("duration must be at least 1 second, got {0}")]
    InvalidDuration(u64),

    /// The payload size does not fit into addressable memory.
    #[error("payload size of {0} bytes is not addressable")]
    PayloadTooLarge(u64),

    /// A setting required by the selected storage backend is missing.
    #[error("please specify the S3 {0}")]
    MissingSetting(&'static str),

    /// The configuration sources could not be merged or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        Self::Load(Box::new(error))
    }
}

/// A convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
