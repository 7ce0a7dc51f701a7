//! Per-tab DOM snapshot cache with a short TTL and mutation invalidation.

use director_core::dom::DomSnapshot;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(30);

struct Entry {
    snapshot: DomSnapshot,
    taken_at: Instant,
}

/// Caches the most recent snapshot per tab. `invalidate` is called after
/// any operation that mutates the DOM (click, type, navigate).
pub struct SnapshotCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a cached, still-fresh snapshot for the tab, if one exists.
    pub fn get(&self, tab: &str) -> Option<DomSnapshot> {
        let entries = self.entries.lock().unwrap();
        entries.get(tab).and_then(|entry| {
            if entry.taken_at.elapsed() < self.ttl {
                Some(entry.snapshot.clone())
            } else {
                None
            }
        })
    }

    pub fn put(&self, tab: &str, snapshot: DomSnapshot) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            tab.to_string(),
            Entry {
                snapshot,
                taken_at: Instant::now(),
            },
        );
    }

    /// Drop the cached snapshot for one tab (called after any mutating op).
    pub fn invalidate(&self, tab: &str) {
        self.entries.lock().unwrap().remove(tab);
    }

    pub fn invalidate_all(&self) {
        self.entries.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn fixture(tab: &str) -> DomSnapshot {
        DomSnapshot {
            snapshot_id: "s1".into(),
            tab_name: tab.into(),
            url: "https://example.com".into(),
            captured_at: "2026-01-01T00:00:00Z".into(),
            element_index: Map::new(),
        }
    }

    #[test]
    fn fresh_entry_is_returned() {
        let cache = SnapshotCache::default();
        cache.put("main", fixture("main"));
        assert!(cache.get("main").is_some());
    }

    #[test]
    fn expired_entry_is_not_returned() {
        let cache = SnapshotCache::new(Duration::from_millis(0));
        cache.put("main", fixture("main"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("main").is_none());
    }

    #[test]
    fn invalidate_clears_the_tab() {
        let cache = SnapshotCache::default();
        cache.put("main", fixture("main"));
        cache.invalidate("main");
        assert!(cache.get("main").is_none());
    }
}
