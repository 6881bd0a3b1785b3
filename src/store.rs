//! Per-tab session storage seam.
//!
//! The browser host backs this with `sessionStorage`; tests use [`MemoryStore`].
//! Reads are tolerant: anything missing or malformed collapses to the empty
//! default and is never reported to the caller.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

/// Key of the "intro screen already played" flag.
pub const SPLASH_SEEN_KEY: &str = "splashSeen";
/// Key of the JSON array of visited deck indices.
pub const SEEN_INDICES_KEY: &str = "seenIndices";

pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-memory store. Clones share the same map, which lets tests inspect what a
/// lesson wrote after handing it a copy.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    map: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.map.borrow_mut().insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.map.borrow_mut().remove(key);
    }
}

pub fn splash_seen(store: &dyn SessionStore) -> bool {
    store.get(SPLASH_SEEN_KEY).as_deref() == Some("1")
}

pub fn mark_splash_seen(store: &mut dyn SessionStore) {
    store.set(SPLASH_SEEN_KEY, "1");
}

/// Load visited indices for a deck of `total` items.
///
/// Invalid JSON, non-integer entries, or any index outside `0..total` discard
/// the whole record.
pub fn load_seen_indices(store: &dyn SessionStore, total: usize) -> BTreeSet<usize> {
    let Some(raw) = store.get(SEEN_INDICES_KEY) else {
        return BTreeSet::new();
    };
    match serde_json::from_str::<Vec<i64>>(&raw) {
        Ok(values) => {
            if values.iter().all(|&v| v >= 0 && (v as u64) < total as u64) {
                values.into_iter().map(|v| v as usize).collect()
            } else {
                log::warn!("store: discarding {} with out-of-range index", SEEN_INDICES_KEY);
                BTreeSet::new()
            }
        }
        Err(e) => {
            log::warn!("store: discarding malformed {}: {}", SEEN_INDICES_KEY, e);
            BTreeSet::new()
        }
    }
}

pub fn save_seen_indices(store: &mut dyn SessionStore, seen: &BTreeSet<usize>) {
    match serde_json::to_string(seen) {
        Ok(json) => store.set(SEEN_INDICES_KEY, &json),
        Err(e) => log::warn!("store: failed to encode {}: {}", SEEN_INDICES_KEY, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_use_defaults() {
        let store = MemoryStore::new();
        assert!(!splash_seen(&store));
        assert!(load_seen_indices(&store, 5).is_empty());
    }

    #[test]
    fn test_not_json_yields_empty_set() {
        let mut store = MemoryStore::new();
        store.set(SEEN_INDICES_KEY, "not json");
        assert!(load_seen_indices(&store, 3).is_empty());
    }

    #[test]
    fn test_out_of_range_index_discards_record() {
        let mut store = MemoryStore::new();
        store.set(SEEN_INDICES_KEY, "[0, 1, 7]");
        assert!(load_seen_indices(&store, 3).is_empty());
        store.set(SEEN_INDICES_KEY, "[-1]");
        assert!(load_seen_indices(&store, 3).is_empty());
    }

    #[test]
    fn test_saved_indices_load_back() {
        let mut store = MemoryStore::new();
        let seen: BTreeSet<usize> = [2, 0].into_iter().collect();
        save_seen_indices(&mut store, &seen);
        assert_eq!(store.get(SEEN_INDICES_KEY).as_deref(), Some("[0,2]"));
        assert_eq!(load_seen_indices(&store, 3), seen);
    }

    #[test]
    fn test_splash_flag_requires_exact_one() {
        let mut store = MemoryStore::new();
        store.set(SPLASH_SEEN_KEY, "true");
        assert!(!splash_seen(&store));
        mark_splash_seen(&mut store);
        assert!(splash_seen(&store));
    }
}
