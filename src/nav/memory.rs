use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_FOCUS_MEMORY_LIMIT: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct FocusEntry {
    index: usize,
    last_used: u64,
}

/// Last grid focus per category, bounded by a least-recently-used cap.
///
/// Writes only flip `dirty`; the owner decides when to flush to disk, so a
/// keystroke never waits on persistence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FocusMemory {
    entries: BTreeMap<String, FocusEntry>,
    #[serde(default)]
    clock: u64,
    #[serde(skip, default = "default_limit")]
    limit: usize,
    #[serde(skip)]
    dirty: bool,
}

fn default_limit() -> usize {
    DEFAULT_FOCUS_MEMORY_LIMIT
}

impl Default for FocusMemory {
    fn default() -> Self {
        Self::with_limit(DEFAULT_FOCUS_MEMORY_LIMIT)
    }
}

impl FocusMemory {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            clock: 0,
            limit: limit.max(1),
            dirty: false,
        }
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        self.evict();
    }

    pub fn get(&self, category: &str) -> Option<usize> {
        self.entries.get(category).map(|entry| entry.index)
    }

    pub fn remember(&mut self, category: &str, index: usize) {
        self.clock += 1;
        let clock = self.clock;
        match self.entries.get_mut(category) {
            Some(entry) if entry.index == index => {
                entry.last_used = clock;
                return;
            }
            Some(entry) => {
                entry.index = index;
                entry.last_used = clock;
            }
            None => {
                self.entries.insert(
                    category.to_string(),
                    FocusEntry {
                        index,
                        last_used: clock,
                    },
                );
                self.evict();
            }
        }
        self.dirty = true;
    }

    /// Drop entries for categories that no longer exist.
    pub fn retain_known<'a>(&mut self, known: impl IntoIterator<Item = &'a str>) {
        let known: Vec<&str> = known.into_iter().collect();
        let before = self.entries.len();
        self.entries.retain(|slug, _| known.contains(&slug.as_str()));
        if self.entries.len() != before {
            self.dirty = true;
        }
    }

    fn evict(&mut self) {
        while self.entries.len() > self.limit {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(slug, _)| slug.clone());
            match oldest {
                Some(slug) => {
                    self.entries.remove(&slug);
                    self.dirty = true;
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clears the dirty flag; call after a successful write.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remember_and_get() {
        let mut memory = FocusMemory::default();
        assert_eq!(memory.get("fish"), None);
        memory.remember("fish", 12);
        assert_eq!(memory.get("fish"), Some(12));
        assert!(memory.is_dirty());
    }

    #[test]
    fn test_same_index_does_not_dirty() {
        let mut memory = FocusMemory::default();
        memory.remember("fish", 3);
        memory.mark_clean();
        memory.remember("fish", 3);
        assert!(!memory.is_dirty());
    }

    #[test]
    fn test_least_recently_used_entry_is_evicted() {
        let mut memory = FocusMemory::with_limit(2);
        memory.remember("fish", 1);
        memory.remember("crops", 2);
        memory.remember("fish", 4);
        memory.remember("minerals", 3);
        assert_eq!(memory.len(), 2);
        assert_eq!(memory.get("crops"), None);
        assert_eq!(memory.get("fish"), Some(4));
        assert_eq!(memory.get("minerals"), Some(3));
    }

    #[test]
    fn test_retain_known_purges_stale_categories() {
        let mut memory = FocusMemory::default();
        memory.remember("fish", 1);
        memory.remember("old-category", 9);
        memory.mark_clean();
        memory.retain_known(["fish", "crops"]);
        assert_eq!(memory.get("old-category"), None);
        assert_eq!(memory.get("fish"), Some(1));
        assert!(memory.is_dirty());
    }

    #[test]
    fn test_serde_roundtrip_keeps_entries() {
        let mut memory = FocusMemory::default();
        memory.remember("fish", 5);
        let json = serde_json::to_string(&memory).unwrap();
        let restored: FocusMemory = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.get("fish"), Some(5));
        assert!(!restored.is_dirty());
    }
}
