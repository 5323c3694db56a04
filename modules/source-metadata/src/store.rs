// In-memory URL → entry map. Keys are exact strings; no normalization.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::entry::MetadataEntry;

#[derive(Debug, Default)]
pub struct MetadataStore {
    entries: RwLock<HashMap<String, MetadataEntry>>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest known entry, or `None` if resolution was never requested.
    pub fn get(&self, url: &str) -> Option<MetadataEntry> {
        self.read().get(url).cloned()
    }

    /// Replace the entry for `url` wholesale. Callers pass a complete entry.
    pub fn set(&self, url: &str, entry: MetadataEntry) {
        self.write().insert(url.to_string(), entry);
    }

    pub fn contains(&self, url: &str) -> bool {
        self.read().contains_key(url)
    }

    pub fn remove(&self, url: &str) -> Option<MetadataEntry> {
        self.write().remove(url)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A poisoned lock only means a writer panicked mid-insert; the map is still usable.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, MetadataEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, MetadataEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}
