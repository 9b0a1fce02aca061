//! Process-local path cache
//!
//! Maps normalized logical paths to the remote IDs they resolved to. Entries
//! are populated lazily and never revalidated; every mutation of the remote
//! graph made through gdpath must evict the entries it affects.

use std::collections::HashMap;

use super::newtypes::{PathKey, RemoteId};

/// Mapping from [`PathKey`] to [`RemoteId`]
#[derive(Debug, Clone, Default)]
pub struct PathCache {
    entries: HashMap<PathKey, RemoteId>,
}

impl PathCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a cached ID
    pub fn get(&self, path: &PathKey) -> Option<&RemoteId> {
        self.entries.get(path)
    }

    /// Whether `path` has a cached ID
    pub fn contains(&self, path: &PathKey) -> bool {
        self.entries.contains_key(path)
    }

    /// Records the ID `path` resolved to, replacing any previous entry
    pub fn insert(&mut self, path: PathKey, id: RemoteId) {
        self.entries.insert(path, id);
    }

    /// Removes `path` and every cached path underneath it
    ///
    /// Returns the ID that was cached for `path` itself, if any. The root is
    /// never evicted.
    pub fn evict(&mut self, path: &PathKey) -> Option<RemoteId> {
        if path.is_root() {
            return None;
        }
        let removed = self.entries.remove(path);
        self.entries.retain(|key, _| !key.starts_with(path));
        removed
    }

    /// Number of cached paths
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
