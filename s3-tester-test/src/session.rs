//! Sessions with controlled failures and delays.
//!
//! Both wrap an [`InMemorySession`], so successful operations behave like a real store: objects
//! can be read back and are gone after deletion.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use s3_tester::session::{
    InMemorySession, Operation, StorageSession, TransferError, TransferResult,
};

/// Decides which calls of a [`FaultySession`] fail.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FaultPolicy {
    /// Every upload fails. Downloads and deletions are never reached by the benchmark.
    FailPuts,
    /// Every download fails, after the upload stored the object.
    FailGets,
    /// Every deletion fails, leaving the object in place.
    FailDeletes,
    /// The first `n` calls fail, regardless of the operation.
    FailFirst(usize),
}

/// A session that fails according to a [`FaultPolicy`].
#[derive(Debug)]
pub struct FaultySession {
    inner: InMemorySession,
    policy: FaultPolicy,
    calls: AtomicUsize,
}

impl FaultySession {
    /// Creates an empty session failing per `policy`.
    pub fn new(policy: FaultPolicy) -> Self {
        Self {
            inner: InMemorySession::new(),
            policy,
            calls: AtomicUsize::new(0),
        }
    }

    /// Total number of calls to any operation so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, operation: Operation) -> TransferResult<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let fail = match self.policy {
            FaultPolicy::FailPuts => operation == Operation::Upload,
            FaultPolicy::FailGets => operation == Operation::Download,
            FaultPolicy::FailDeletes => operation == Operation::Delete,
            FaultPolicy::FailFirst(n) => call < n,
        };

        if fail {
            return Err(TransferError::Generic {
                context: format!("{operation} #{call}"),
                cause: Box::new(io::Error::other("injected failure")),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl StorageSession for FaultySession {
    fn name(&self) -> &'static str {
        "faulty"
    }

    async fn put_object(&self, key: &str, body: Bytes) -> TransferResult<()> {
        self.check(Operation::Upload)?;
        self.inner.put_object(key, body).await
    }

    async fn get_object(&self, key: &str) -> TransferResult<Bytes> {
        self.check(Operation::Download)?;
        self.inner.get_object(key).await
    }

    async fn delete_object(&self, key: &str) -> TransferResult<()> {
        self.check(Operation::Delete)?;
        self.inner.delete_object(key).await
    }
}

/// A session that delays every operation by a fixed amount.
#[derive(Debug)]
pub struct SlowSession {
    inner: InMemorySession,
    delay: Duration,
    puts: AtomicUsize,
}

impl SlowSession {
    /// Creates an empty session sleeping for `delay` before each operation.
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemorySession::new(),
            delay,
            puts: AtomicUsize::new(0),
        }
    }

    /// Number of uploads started so far.
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of objects currently stored.
    pub fn stored(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait::async_trait]
impl StorageSession for SlowSession {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn put_object(&self, key: &str, body: Bytes) -> TransferResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.inner.put_object(key, body).await
    }

    async fn get_object(&self, key: &str) -> TransferResult<Bytes> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_object(key).await
    }

    async fn delete_object(&self, key: &str) -> TransferResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete_object(key).await
    }
}
