//! TTL-bounded record of failure IDs that have already been evaluated
//!
//! An entry maps a failure ID to the `finished` timestamp seen the first time
//! the ID showed up. The cache does not know whether the failure was reported,
//! only that it was considered.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::trace;

#[derive(Debug, Clone, Default)]
pub struct RecentFailureCache {
    entries: HashMap<String, DateTime<Utc>>,
}

impl RecentFailureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp recorded for `id`, if present
    pub fn seen(&self, id: &str) -> Option<DateTime<Utc>> {
        self.entries.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Record `id` unless it is already present. An existing entry keeps its
    /// original timestamp.
    pub fn record(&mut self, id: &str, finished: DateTime<Utc>) {
        self.entries.entry(id.to_string()).or_insert(finished);
    }

    /// Remove every entry recorded at least `window` before `now`.
    ///
    /// Returns the number of removed entries.
    pub fn evict(&mut self, now: DateTime<Utc>, window: TimeDelta) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, recorded| {
            let keep = now.signed_duration_since(*recorded) < window;
            if !keep {
                trace!("evicting {id} from recent failures");
            }
            keep
        });
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
