//! Path to node cache.

use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;

use crate::fs::node::ResourceEntry;
use crate::fs::path::{is_within, parent_path};

/// In-memory mapping from normalized path to remote node metadata.
///
/// The root path is always present. Entries are keyed by absolute path, so a
/// directory's subtree is a contiguous key range.
#[derive(Debug, Clone)]
pub struct ResourceCache {
    entries: BTreeMap<String, ResourceEntry>,
}

impl ResourceCache {
    /// Cache holding only the root entry.
    pub fn new(root_dir_id: u64) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert("/".to_string(), ResourceEntry::root(root_dir_id));
        Self { entries }
    }

    /// Rebuild from persisted entries. The root is re-seeded when missing.
    pub fn from_entries(root_dir_id: u64, entries: BTreeMap<String, ResourceEntry>) -> Self {
        let mut cache = Self { entries };
        cache
            .entries
            .entry("/".to_string())
            .or_insert_with(|| ResourceEntry::root(root_dir_id));
        cache
    }

    pub fn entries(&self) -> &BTreeMap<String, ResourceEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&ResourceEntry> {
        self.entries.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut ResourceEntry> {
        self.entries.get_mut(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Insert or overwrite one entry.
    pub fn insert(&mut self, path: String, entry: ResourceEntry) {
        match self.entries.get_mut(&path) {
            Some(existing) => existing.refresh_from(entry),
            None => {
                self.entries.insert(path, entry);
            }
        }
    }

    /// Remove `path` and everything cached below it. The root is never removed.
    pub fn remove_subtree(&mut self, path: &str) -> Option<ResourceEntry> {
        if path == "/" {
            return None;
        }
        let below: Vec<String> = self
            .subtree_keys(path)
            .into_iter()
            .filter(|k| k != path)
            .collect();
        for key in below {
            self.entries.remove(&key);
        }
        self.entries.remove(path)
    }

    /// Move `from` and its cached subtree under the key `to`.
    pub fn rename_subtree(&mut self, from: &str, to: &str) {
        if from == "/" || from == to {
            return;
        }
        let keys = self.subtree_keys(from);
        if keys.is_empty() {
            return;
        }
        // Whatever was cached at the destination is replaced.
        self.remove_subtree(to);
        for key in keys {
            if let Some(entry) = self.entries.remove(&key) {
                let moved = format!("{}{}", to, &key[from.len()..]);
                self.entries.insert(moved, entry);
            }
        }
    }

    /// Replace the direct children of `dir` with a fresh listing.
    ///
    /// Children that are absent from the listing are dropped with their
    /// subtrees; the others are upserted.
    pub fn replace_children(&mut self, dir: &str, children: Vec<(String, ResourceEntry)>) {
        let fresh: HashSet<&str> = children.iter().map(|(p, _)| p.as_str()).collect();
        let stale: Vec<String> = self
            .children(dir)
            .into_iter()
            .filter(|p| !fresh.contains(p.as_str()))
            .collect();
        for path in stale {
            tracing::debug!("dropping stale cache entry {}", path);
            self.remove_subtree(&path);
        }
        for (path, entry) in children {
            self.insert(path, entry);
        }
    }

    /// Cached direct children of `dir`.
    pub fn children(&self, dir: &str) -> Vec<String> {
        self.subtree_keys(dir)
            .into_iter()
            .filter(|k| k != dir && parent_path(k) == Some(dir))
            .collect()
    }

    fn subtree_keys(&self, path: &str) -> Vec<String> {
        self.entries
            .range::<str, _>((Bound::Included(path), Bound::Unbounded))
            .take_while(|(k, _)| path == "/" || k.starts_with(path))
            .filter(|(k, _)| is_within(k, path))
            .map(|(k, _)| k.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> ResourceCache {
        let mut cache = ResourceCache::new(1);
        cache.insert("/a".into(), ResourceEntry::directory(2, 1, 0));
        cache.insert("/a/b".into(), ResourceEntry::directory(3, 2, 0));
        cache.insert("/a/b/f.txt".into(), ResourceEntry::file(4, 3, 0, 10));
        cache.insert("/ab".into(), ResourceEntry::file(5, 1, 0, 1));
        cache
    }

    #[test]
    fn test_root_is_seeded() {
        let cache = ResourceCache::new(42);
        assert_eq!(cache.get("/").map(|e| e.node_id), Some(42));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove_subtree() {
        let mut cache = populated();
        let removed = cache.remove_subtree("/a").unwrap();
        assert_eq!(removed.node_id, 2);
        assert!(!cache.contains("/a/b"));
        assert!(!cache.contains("/a/b/f.txt"));
        assert!(cache.contains("/ab"));
        assert!(cache.remove_subtree("/").is_none());
    }

    #[test]
    fn test_rename_subtree() {
        let mut cache = populated();
        cache.rename_subtree("/a", "/z");
        assert!(!cache.contains("/a"));
        assert_eq!(cache.get("/z/b/f.txt").map(|e| e.node_id), Some(4));
        assert_eq!(cache.get("/z").map(|e| e.node_id), Some(2));
        assert!(cache.contains("/ab"));
    }

    #[test]
    fn test_replace_children_prunes_stale() {
        let mut cache = populated();
        cache.replace_children(
            "/",
            vec![
                ("/ab".into(), ResourceEntry::file(5, 1, 0, 9)),
                ("/c".into(), ResourceEntry::directory(6, 1, 0)),
            ],
        );
        assert!(!cache.contains("/a"));
        assert!(!cache.contains("/a/b/f.txt"));
        assert_eq!(cache.get("/ab").map(|e| e.size), Some(9));
        assert!(cache.contains("/c"));
        assert_eq!(cache.children("/"), vec!["/ab".to_string(), "/c".to_string()]);
    }

    #[test]
    fn test_children_are_direct_only() {
        let cache = populated();
        assert_eq!(cache.children("/a"), vec!["/a/b".to_string()]);
    }

    #[test]
    fn test_from_entries_reseeds_root() {
        let cache = ResourceCache::from_entries(9, BTreeMap::new());
        assert_eq!(cache.get("/").map(|e| e.node_id), Some(9));
    }
}
