//! Per-path mutual exclusion.
//!
//! A local diff-and-broadcast and an inbound apply for the same path must
//! not interleave. Each path gets its own async mutex; different paths never
//! wait on each other.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Held while a path is being read, diffed or patched.
pub type PathGuard = OwnedMutexGuard<()>;

/// Table of per-path locks, shared by cloning.
#[derive(Debug, Clone, Default)]
pub struct PathLocks {
    table: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl PathLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `path`.
    pub async fn lock(&self, path: &str) -> PathGuard {
        // The map shard must not be held across the await.
        let mutex = self
            .table
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Whether some task currently holds `path`.
    pub fn is_locked(&self, path: &str) -> bool {
        self.table
            .get(path)
            .map(|mutex| mutex.try_lock().is_err())
            .unwrap_or(false)
    }

    /// Forget entries nobody holds or waits on.
    pub fn prune(&self) {
        self.table.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    /// Number of tracked paths.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no path is tracked.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_path_is_exclusive() {
        let locks = PathLocks::new();
        let guard = locks.lock("a.txt").await;
        assert!(locks.is_locked("a.txt"));

        let contender = locks.clone();
        let waiter = tokio::spawn(async move {
            let _guard = contender.lock("a.txt").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
        assert!(!locks.is_locked("a.txt"));
    }

    #[tokio::test]
    async fn different_paths_do_not_block() {
        let locks = PathLocks::new();
        let _a = locks.lock("a.txt").await;
        let _b = locks.lock("b.txt").await;
        assert!(locks.is_locked("a.txt"));
        assert!(locks.is_locked("b.txt"));
    }

    #[tokio::test]
    async fn prune_drops_idle_entries() {
        let locks = PathLocks::new();
        let held = locks.lock("held.txt").await;
        drop(locks.lock("idle.txt").await);
        assert_eq!(locks.len(), 2);

        locks.prune();
        assert_eq!(locks.len(), 1);
        assert!(locks.is_locked("held.txt"));

        drop(held);
        locks.prune();
        assert!(locks.is_empty());
    }

    #[test]
    fn unknown_path_is_not_locked() {
        assert!(!PathLocks::new().is_locked("nope"));
    }
}
