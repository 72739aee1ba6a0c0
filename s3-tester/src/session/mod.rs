//! Storage sessions the benchmark runs against.
//!
//! A [`StorageSession`] exposes the three object operations the benchmark needs. Timing is not the
//! implementation's concern: the timed entry points [`put`](dyn StorageSession::put),
//! [`get`](dyn StorageSession::get) and [`delete`](dyn StorageSession::delete) wrap every call with
//! a monotonic clock so all sessions are measured the same way.

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use thiserror::Error;

mod in_memory;
mod s3_compatible;

pub use in_memory::InMemorySession;
pub use s3_compatible::{ConnectError, S3Session, S3SessionConfig};

/// A shared, type-erased [`StorageSession`] instance.
pub type SharedSession = Arc<dyn StorageSession>;

/// An object store reachable through put, get and delete by key.
#[async_trait::async_trait]
pub trait StorageSession: fmt::Debug + Send + Sync + 'static {
    /// The session name, used for diagnostics.
    fn name(&self) -> &'static str;

    /// Stores `body` under `key`, replacing any previous object.
    async fn put_object(&self, key: &str, body: Bytes) -> TransferResult<()>;

    /// Reads back the full contents of the object stored under `key`.
    async fn get_object(&self, key: &str) -> TransferResult<Bytes>;

    /// Removes the object stored under `key`.
    async fn delete_object(&self, key: &str) -> TransferResult<()>;
}

impl dyn StorageSession {
    /// Uploads an object and returns how long the upload took.
    pub async fn put(&self, key: &str, body: Bytes) -> TransferResult<Duration> {
        let start = Instant::now();
        self.put_object(key, body).await?;
        Ok(start.elapsed())
    }

    /// Downloads an object and returns its contents along with how long the download took.
    pub async fn get(&self, key: &str) -> TransferResult<(Bytes, Duration)> {
        let start = Instant::now();
        let body = self.get_object(key).await?;
        Ok((body, start.elapsed()))
    }

    /// Deletes an object and returns how long the deletion took.
    pub async fn delete(&self, key: &str) -> TransferResult<Duration> {
        let start = Instant::now();
        self.delete_object(key).await?;
        Ok(start.elapsed())
    }
}

/// The object operations performed by every benchmark iteration.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operation {
    /// Put of a fresh object.
    Upload,
    /// Get of the object that was just uploaded.
    Download,
    /// Delete of the object that was just downloaded.
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Upload => "upload",
            Self::Download => "download",
            Self::Delete => "delete",
        })
    }
}

/// A failed step of a benchmark iteration.
///
/// The benchmark only counts these, it never retries.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Any error emitted by the S3 client, including non-success responses.
    #[error("s3 error: {0}")]
    S3(#[from] s3::error::S3Error),

    /// The store answered with a status code that does not indicate success.
    #[error("unexpected status {status} during {operation} of '{key}'")]
    UnexpectedStatus {
        /// The operation that was attempted.
        operation: Operation,
        /// The object key.
        key: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The object does not exist.
    #[error("object '{0}' not found")]
    NotFound(String),

    /// A download returned different contents than were uploaded.
    #[error("contents of '{key}' do not match: expected {expected} bytes, got {actual}")]
    ContentMismatch {
        /// The object key.
        key: String,
        /// Size of the uploaded payload.
        expected: usize,
        /// Size of the downloaded body.
        actual: usize,
    },

    /// The random payload could not be generated.
    #[error("failed to generate payload")]
    Entropy(#[source] Box<dyn Error + Send + Sync>),

    /// Any other failure of a session, which might be specific to that session.
    #[error("storage error: {context}")]
    Generic {
        /// What the session was doing.
        context: String,
        /// The underlying cause.
        #[source]
        cause: Box<dyn Error + Send + Sync>,
    },
}

/// Result type for session operations.
pub type TransferResult<T> = Result<T, TransferError>;
