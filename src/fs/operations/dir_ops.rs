//! Create, delete and rename.

use crate::error::{QuqiError, Result};
use crate::fs::filesystem::QuqiFileSystem;
use crate::fs::node::{ResourceEntry, ResourceKind};
use crate::fs::path::{base_name, normalize_path, parent_path};

use super::unix_now;

impl QuqiFileSystem {
    /// Create a resource.
    ///
    /// Directories are created remotely and cached. Files are a no-op: the
    /// service has no empty-file action, so the first write creates them.
    pub async fn create(&self, path: &str, kind: ResourceKind) -> Result<()> {
        let path = normalize_path(path);
        let (parent, name) = split(&path)?;
        let parent_entry = self.resolve_dir(parent).await?;

        match kind {
            ResourceKind::Directory => {
                let node_id = self.api.mkdir(parent_entry.node_id, name).await?;
                tracing::info!("created directory {} (node {})", path, node_id);
                let entry = ResourceEntry::directory(node_id, parent_entry.node_id, unix_now());
                self.cache.write().await.insert(path, entry);
            }
            ResourceKind::File => {
                tracing::debug!("deferring creation of {} to its first write", path);
            }
        }
        Ok(())
    }

    /// Create a directory.
    pub async fn mkdir(&self, path: &str) -> Result<()> {
        self.create(path, ResourceKind::Directory).await
    }

    /// Delete a resource. The cache entry (and its subtree) is dropped only
    /// after the remote delete succeeded.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let path = normalize_path(path);
        if path == "/" {
            return Err(QuqiError::Unsupported("deleting the root".to_string()));
        }
        let entry = self.resolve(&path).await?;
        self.api.delete(entry.node_id).await?;

        tracing::info!("deleted {} (node {})", path, entry.node_id);
        self.cache.write().await.remove_subtree(&path);
        Ok(())
    }

    /// Rename within one directory.
    ///
    /// Moving to a different directory cannot be expressed remotely and
    /// fails with [`QuqiError::Unsupported`].
    pub async fn move_resource(&self, from: &str, to: &str) -> Result<()> {
        let from = normalize_path(from);
        let to = normalize_path(to);
        let (from_parent, _) = split(&from)?;
        let (to_parent, new_name) = split(&to)?;
        if from_parent != to_parent {
            return Err(QuqiError::Unsupported(format!(
                "moving {} to another directory ({})",
                from, to
            )));
        }
        let entry = self.resolve(&from).await?;
        if from == to {
            return Ok(());
        }

        self.api.rename(entry.node_id, new_name).await?;

        tracing::info!("renamed {} to {}", from, to);
        self.cache.write().await.rename_subtree(&from, &to);
        Ok(())
    }
}

/// Split a normalized non-root path into parent and name.
pub(crate) fn split(path: &str) -> Result<(&str, &str)> {
    match parent_path(path) {
        Some(parent) => Ok((parent, base_name(path))),
        None => Err(QuqiError::Unsupported(format!("{} has no parent", path))),
    }
}
