//! In-memory session.
//!
//! This provides a [`StorageSession`] backed by a `HashMap`. It is used for dry runs that measure
//! the harness itself and as the base for fault-injecting sessions in tests. The session is
//! [`Clone`] so tests can hold a handle for direct inspection while the benchmark owns a shared
//! copy.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;

use super::{StorageSession, TransferError, TransferResult};

type Store = HashMap<String, Bytes>;

/// A [`StorageSession`] that keeps objects in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySession {
    store: Arc<Mutex<Store>>,
}

impl InMemorySession {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if an object is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.store().contains_key(key)
    }

    /// Returns the number of stored objects.
    pub fn len(&self) -> usize {
        self.store().len()
    }

    /// Returns `true` if no objects are stored.
    pub fn is_empty(&self) -> bool {
        self.store().is_empty()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl StorageSession for InMemorySession {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn put_object(&self, key: &str, body: Bytes) -> TransferResult<()> {
        self.store().insert(key.to_owned(), body);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> TransferResult<Bytes> {
        self.store()
            .get(key)
            .cloned()
            .ok_or_else(|| TransferError::NotFound(key.to_owned()))
    }

    async fn delete_object(&self, key: &str) -> TransferResult<()> {
        self.store()
            .remove(key)
            .map(drop)
            .ok_or_else(|| TransferError::NotFound(key.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_removes() {
        let session = InMemorySession::new();
        assert!(session.is_empty());

        session
            .put_object("a", Bytes::from_static(b"payload"))
            .await
            .unwrap();
        assert!(session.contains("a"));
        assert_eq!(session.len(), 1);
        assert_eq!(
            session.get_object("a").await.unwrap(),
            Bytes::from_static(b"payload")
        );

        session.delete_object("a").await.unwrap();
        assert!(session.is_empty());
        assert!(matches!(
            session.delete_object("a").await,
            Err(TransferError::NotFound(_))
        ));
    }
}
