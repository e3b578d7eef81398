//! Path resolution, listing and metadata lookups.

use std::collections::HashSet;

use crate::error::{QuqiError, Result};
use crate::fs::filesystem::QuqiFileSystem;
use crate::fs::node::{ResourceEntry, ResourceKind};
use crate::fs::path::{ancestors, join_path, normalize_path};

impl QuqiFileSystem {
    /// List a directory remotely and cache its children.
    ///
    /// The listing replaces the cached children of `path` in one batch;
    /// on failure the cache is left untouched.
    ///
    /// # Returns
    /// Absolute paths of the children, directories first.
    pub async fn list_directory(&self, path: &str) -> Result<Vec<String>> {
        let path = normalize_path(path);
        let entry = self.resolve(&path).await?;
        if !entry.is_directory() {
            return Err(QuqiError::NotADirectory(path));
        }
        self.list_node(entry.node_id, &path).await
    }

    pub(crate) async fn list_node(&self, node_id: u64, path: &str) -> Result<Vec<String>> {
        let listing = self.api.list_dir(node_id).await.inspect_err(|e| {
            tracing::warn!("listing {} failed: {}", path, e);
        })?;

        let dirs = listing
            .dir
            .iter()
            .map(|dir| (join_path(path, &dir.name), ResourceEntry::from(dir)));
        let files = listing
            .file
            .iter()
            .map(|file| (join_path(path, &file.display_name()), ResourceEntry::from(file)));

        let mut seen = HashSet::new();
        let mut children: Vec<(String, ResourceEntry)> =
            Vec::with_capacity(listing.dir.len() + listing.file.len());
        for (child, mut entry) in dirs.chain(files) {
            // Children belong to the directory just listed, whatever the wire says.
            entry.parent_id = node_id;
            if !seen.insert(child.clone()) {
                tracing::warn!("{} is listed twice in {}, keeping the first entry", child, path);
                continue;
            }
            children.push((child, entry));
        }
        let paths: Vec<String> = children.iter().map(|(p, _)| p.clone()).collect();

        tracing::debug!("listed {} ({} entries)", path, paths.len());
        self.cache.write().await.replace_children(path, children);
        Ok(paths)
    }

    /// Cached entry for `path`, reloading its ancestor chain once if missing.
    pub(crate) async fn resolve(&self, path: &str) -> Result<ResourceEntry> {
        if let Some(entry) = self.cache.read().await.get(path) {
            return Ok(entry.clone());
        }
        self.reload_ancestors(path).await?;
        self.cache
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| QuqiError::NotFound(path.to_string()))
    }

    /// Resolve the parent directory of `path`, which must be a directory.
    pub(crate) async fn resolve_dir(&self, path: &str) -> Result<ResourceEntry> {
        let entry = self.resolve(path).await?;
        if entry.is_directory() {
            Ok(entry)
        } else {
            Err(QuqiError::NotADirectory(path.to_string()))
        }
    }

    /// Populate the cache down to the parent of `path`.
    ///
    /// Starts at the deepest cached ancestor and lists every level below it,
    /// top-down, stopping early when a level turns out not to exist.
    async fn reload_ancestors(&self, path: &str) -> Result<()> {
        let chain = ancestors(path);
        let start = {
            let cache = self.cache.read().await;
            chain.iter().rposition(|p| cache.contains(p)).unwrap_or(0)
        };

        for dir in &chain[start..] {
            let node = self.cache.read().await.get(dir).cloned();
            match node {
                Some(entry) if entry.is_directory() => {
                    tracing::debug!("lazy reload of {} for {}", dir, path);
                    self.list_node(entry.node_id, dir).await?;
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Metadata of `path`.
    pub async fn stat(&self, path: &str) -> Result<ResourceEntry> {
        self.resolve(&normalize_path(path)).await
    }

    /// Whether `path` exists, after the usual lazy reload.
    pub async fn exists(&self, path: &str) -> Result<bool> {
        match self.stat(path).await {
            Ok(_) => Ok(true),
            Err(QuqiError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn resource_type(&self, path: &str) -> Result<ResourceKind> {
        Ok(self.stat(path).await?.kind)
    }

    /// Size in bytes (0 for directories).
    pub async fn size(&self, path: &str) -> Result<u64> {
        Ok(self.stat(path).await?.size)
    }

    /// Creation time, seconds since epoch.
    pub async fn creation_date(&self, path: &str) -> Result<i64> {
        Ok(self.stat(path).await?.created_at)
    }

    /// The service only reports one timestamp, so this equals the creation time.
    pub async fn last_modified_date(&self, path: &str) -> Result<i64> {
        self.creation_date(path).await
    }

    /// Re-read one entry's metadata from the remote stat action.
    pub async fn refresh(&self, path: &str) -> Result<ResourceEntry> {
        let path = normalize_path(path);
        let entry = self.resolve(&path).await?;
        let stat = self.api.stat_node(entry.node_id).await?;

        let mut cache = self.cache.write().await;
        let cached = cache
            .get_mut(&path)
            .ok_or_else(|| QuqiError::NotFound(path.clone()))?;
        cached.apply_stat(&stat);
        Ok(cached.clone())
    }
}
