//! Persisting the adapter across restarts.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{Account, ClientConfig};
use crate::error::{QuqiError, Result};
use crate::fs::cache::ResourceCache;
use crate::fs::filesystem::QuqiFileSystem;
use crate::fs::node::ResourceEntry;

/// Current blob format.
pub const STATE_VERSION: u32 = 1;

/// Everything needed to rebuild an adapter without re-walking the tree.
///
/// Session tokens are not included; a restored adapter logs in again on
/// [`QuqiFileSystem::connect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSystemBlob {
    pub version: u32,
    pub resources: BTreeMap<String, ResourceEntry>,
    pub username: String,
    pub password: String,
    pub cloud_id: u64,
    pub root_dir_id: u64,
}

impl FileSystemBlob {
    pub fn account(&self) -> Account {
        Account::new(
            self.username.clone(),
            self.password.clone(),
            self.cloud_id,
            self.root_dir_id,
        )
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let blob: Self = serde_json::from_str(data)
            .map_err(|e| QuqiError::InvalidState(format!("unreadable state: {}", e)))?;
        if blob.version != STATE_VERSION {
            return Err(QuqiError::InvalidState(format!(
                "unsupported state version {}",
                blob.version
            )));
        }
        Ok(blob)
    }
}

impl QuqiFileSystem {
    /// Capture the cache and account as a blob.
    pub async fn dump(&self) -> FileSystemBlob {
        let account = self.account();
        FileSystemBlob {
            version: STATE_VERSION,
            resources: self.cache.read().await.entries().clone(),
            username: account.username.clone(),
            password: account.password.clone(),
            cloud_id: account.cloud_id,
            root_dir_id: account.root_dir_id,
        }
    }

    /// Rebuild an adapter from a blob. Performs no I/O.
    pub fn restore(blob: FileSystemBlob, config: ClientConfig) -> Result<Self> {
        let account = blob.account();
        let cache = ResourceCache::from_entries(blob.root_dir_id, blob.resources);
        Self::with_cache(config, account, cache)
    }

    /// Save the state as JSON.
    ///
    /// # Example
    /// ```no_run
    /// # use quqifs::{Account, ClientConfig, QuqiFileSystem};
    /// # async fn example() -> quqifs::Result<()> {
    /// let fs = QuqiFileSystem::new(ClientConfig::default(), Account::from_env()?)?;
    /// fs.connect().await?;
    /// fs.list_directory("/").await?;
    /// fs.save("quqifs-state.json").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.dump().await.to_json()?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Load a saved state. Returns `None` if there is no state file.
    pub async fn load<P: AsRef<Path>>(path: P, config: ClientConfig) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await? {
            return Ok(None);
        }
        let data = tokio::fs::read_to_string(path).await?;
        let blob = FileSystemBlob::from_json(data.trim())?;
        tracing::debug!("restored {} cached paths from {}", blob.resources.len(), path.display());
        Ok(Some(Self::restore(blob, config)?))
    }
}
