//! Per-key async locks.
//!
//! `create_or_get` holds the lock of its own (owner, salt) across the
//! materializer call. Callers on other keys never touch it.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub(crate) struct KeyLocks<K: Eq + Hash + Clone> {
    slots: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> KeyLocks<K> {
    pub(crate) fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Wait for exclusive access to `key`.
    pub(crate) async fn lock(&self, key: &K) -> KeyGuard<'_, K> {
        // Clone the slot out so the shard guard is released before awaiting.
        let slot = self.slots.entry(key.clone()).or_default().clone();
        let guard = slot.lock_owned().await;
        KeyGuard {
            locks: self,
            key: key.clone(),
            _guard: guard,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.len()
    }
}

pub(crate) struct KeyGuard<'a, K: Eq + Hash + Clone> {
    locks: &'a KeyLocks<K>,
    key: K,
    _guard: OwnedMutexGuard<()>,
}

impl<K: Eq + Hash + Clone> Drop for KeyGuard<'_, K> {
    fn drop(&mut self) {
        // Map and guard hold one reference each; more means someone is waiting.
        self.locks
            .slots
            .remove_if(&self.key, |_, slot| Arc::strong_count(slot) <= 2);
    }
}
