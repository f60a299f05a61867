//! Per-container serialization of lifecycle operations.
//!
//! At most one operation holds a given container id. A second caller does
//! not wait; it gets [`DockboardError::Busy`] immediately. Entries exist
//! only while held, so the map is empty whenever the dashboard is idle.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use dockboard_common::error::{DockboardError, Result};

/// Set of container ids with an operation in flight.
#[derive(Debug, Clone, Default)]
pub struct KeyedLocks {
    held: Arc<Mutex<HashSet<String>>>,
}

impl KeyedLocks {
    /// Creates an empty lock map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `key` until the returned guard is dropped.
    ///
    /// # Errors
    ///
    /// Returns `Busy` if another guard for `key` is alive.
    pub fn try_acquire(&self, key: &str) -> Result<KeyGuard> {
        let mut held = self
            .held
            .lock()
            .map_err(|_| DockboardError::runtime("container lock map poisoned"))?;
        if !held.insert(key.to_string()) {
            tracing::debug!(id = %key, "lifecycle operation already in flight");
            return Err(DockboardError::Busy {
                id: key.to_string(),
            });
        }
        Ok(KeyGuard {
            held: Arc::clone(&self.held),
            key: key.to_string(),
        })
    }

    /// Returns whether `key` is currently held.
    #[must_use]
    pub fn is_held(&self, key: &str) -> bool {
        self.held.lock().is_ok_and(|h| h.contains(key))
    }

    /// Number of keys currently held.
    #[must_use]
    pub fn held_count(&self) -> usize {
        self.held.lock().map(|h| h.len()).unwrap_or_default()
    }
}

/// Releases its key on drop.
#[derive(Debug)]
pub struct KeyGuard {
    held: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl KeyGuard {
    /// The held key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // A poisoned map still has to release the key.
        let mut held = match self.held.lock() {
            Ok(held) => held,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = held.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_busy() {
        let locks = KeyedLocks::new();
        let _guard = locks.try_acquire("abc").unwrap();
        assert!(matches!(
            locks.try_acquire("abc"),
            Err(DockboardError::Busy { .. })
        ));
    }

    #[test]
    fn distinct_keys_do_not_contend() {
        let locks = KeyedLocks::new();
        let _a = locks.try_acquire("a").unwrap();
        let _b = locks.try_acquire("b").unwrap();
        assert_eq!(locks.held_count(), 2);
    }

    #[test]
    fn dropping_the_guard_releases_the_key() {
        let locks = KeyedLocks::new();
        {
            let guard = locks.try_acquire("abc").unwrap();
            assert_eq!(guard.key(), "abc");
            assert!(locks.is_held("abc"));
        }
        assert!(!locks.is_held("abc"));
        assert_eq!(locks.held_count(), 0);
        let _again = locks.try_acquire("abc").unwrap();
    }
}
