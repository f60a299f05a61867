//! Descriptions waiting for their container's next recreation.
//!
//! Labels are immutable on an existing container, so a generated
//! description is held here, keyed by container name, until an update
//! recreates the container and writes it as a label.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// In-memory stash of pending description labels.
#[derive(Debug, Default)]
pub struct PendingLabels {
    by_name: Mutex<HashMap<String, String>>,
}

impl PendingLabels {
    /// Creates an empty stash.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `description` for the container named `name`, replacing any
    /// earlier value.
    pub fn record(&self, name: &str, description: &str) {
        if let Ok(mut map) = self.by_name.lock() {
            let _ = map.insert(name.to_string(), description.to_string());
        }
    }

    /// Returns the pending description for `name` without consuming it.
    #[must_use]
    pub fn peek(&self, name: &str) -> Option<String> {
        self.by_name.lock().ok()?.get(name).cloned()
    }

    /// Removes and returns the pending description for `name`.
    pub fn take(&self, name: &str) -> Option<String> {
        self.by_name.lock().ok()?.remove(name)
    }

    /// Drops descriptions of containers not in `names`, typically the
    /// names seen in a full listing.
    pub fn retain_names<'a>(&self, names: impl IntoIterator<Item = &'a str>) {
        let keep: HashSet<&str> = names.into_iter().collect();
        if let Ok(mut map) = self.by_name.lock() {
            let before = map.len();
            map.retain(|name, _| keep.contains(name.as_str()));
            let dropped = before - map.len();
            if dropped > 0 {
                tracing::debug!(dropped, "pruned pending descriptions of vanished containers");
            }
        }
    }

    /// Number of containers with a pending description.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.lock().map(|m| m.len()).unwrap_or_default()
    }

    /// Returns whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
