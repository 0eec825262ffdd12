//! Per-key mutual exclusion with a bounded wait.
//!
//! Mutations against the same (project, kind) key must be serialized;
//! mutations against different keys must not block each other. A
//! [`KeyedLock`] keeps one `tokio::sync::Mutex` per key and bounds lock
//! acquisition with a timeout so a contended caller gets `Busy` instead
//! of waiting indefinitely.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use labtrack_core::error::CoreError;

/// A map of independent per-key mutexes.
///
/// Keys are created lazily on first acquisition and never removed; the
/// key space here (projects × hardware kinds) is small and long-lived.
pub struct KeyedLock<K> {
    locks: RwLock<HashMap<K, Arc<Mutex<()>>>>,
    wait: Duration,
}

impl<K> KeyedLock<K>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    /// Create a lock map whose acquisitions time out after `wait`.
    pub fn new(wait: Duration) -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
            wait,
        }
    }

    /// Acquire the mutex for `key`, waiting at most the configured bound.
    ///
    /// Returns `CoreError::Busy` on timeout; no state is touched in that
    /// case, so the caller can safely retry or surface the failure.
    pub async fn acquire(&self, key: &K) -> Result<OwnedMutexGuard<()>, CoreError> {
        let mutex = self.mutex_for(key).await;

        tokio::time::timeout(self.wait, mutex.lock_owned())
            .await
            .map_err(|_| CoreError::Busy(format!("timed out waiting for key {key:?}")))
    }

    /// Number of keys that currently have a lock entry.
    ///
    /// Entries are created on first acquisition and never removed, so
    /// this also counts every key ever locked.
    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }

    /// Whether no key has ever been locked.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Get or lazily insert the mutex for `key`.
    async fn mutex_for(&self, key: &K) -> Arc<Mutex<()>> {
        // Fast path: the key already has a mutex.
        {
            let locks = self.locks.read().await;
            if let Some(mutex) = locks.get(key) {
                return Arc::clone(mutex);
            }
        }

        let mut locks = self.locks.write().await;
        Arc::clone(
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn same_key_is_mutually_exclusive() {
        let locks = KeyedLock::new(Duration::from_millis(50));
        let key = ("p1".to_string(), "HWSet1".to_string());

        let _held = locks.acquire(&key).await.unwrap();

        // A second acquisition on the same key must time out.
        let second = locks.acquire(&key).await;
        assert_matches!(second, Err(CoreError::Busy(_)));
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = KeyedLock::new(Duration::from_millis(50));
        let a = ("p1".to_string(), "HWSet1".to_string());
        let b = ("p1".to_string(), "HWSet2".to_string());

        let _held_a = locks.acquire(&a).await.unwrap();
        let held_b = locks.acquire(&b).await;
        assert!(held_b.is_ok());
    }

    #[tokio::test]
    async fn len_counts_distinct_keys_once() {
        let locks = KeyedLock::new(Duration::from_millis(50));
        let a = ("p1".to_string(), "HWSet1".to_string());
        let b = ("p1".to_string(), "HWSet2".to_string());

        assert!(locks.is_empty().await);
        drop(locks.acquire(&a).await.unwrap());
        drop(locks.acquire(&a).await.unwrap());
        drop(locks.acquire(&b).await.unwrap());
        assert_eq!(locks.len().await, 2);
    }

    #[tokio::test]
    async fn released_key_can_be_reacquired() {
        let locks = KeyedLock::new(Duration::from_millis(50));
        let key = ("p1".to_string(), "HWSet1".to_string());

        drop(locks.acquire(&key).await.unwrap());
        assert!(locks.acquire(&key).await.is_ok());
    }
}
