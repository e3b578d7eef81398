//! The path-namespace adapter over a Quqi drive.

use std::collections::BTreeMap;

use tokio::sync::RwLock;

use crate::api::ApiClient;
use crate::config::{Account, ClientConfig};
use crate::error::{QuqiError, Result};
use crate::fs::cache::ResourceCache;
use crate::fs::node::{LockRecord, ResourceEntry};
use crate::fs::path::normalize_path;
use crate::progress::ProgressCallback;

/// Hierarchical view of a node-addressed cloud drive.
///
/// Paths are mapped to remote node ids through a lazily populated cache.
/// The cache lock is never held across a remote call; listings are applied
/// in one write-locked batch.
///
/// # Example
/// ```no_run
/// use quqifs::{Account, ClientConfig, QuqiFileSystem};
///
/// # async fn example() -> quqifs::Result<()> {
/// let account = Account::new("13800000000", "secret", 115540, 43);
/// let fs = QuqiFileSystem::new(ClientConfig::default(), account)?;
/// fs.connect().await?;
///
/// for path in fs.list_directory("/").await? {
///     println!("{}", path);
/// }
/// # Ok(())
/// # }
/// ```
pub struct QuqiFileSystem {
    pub(crate) api: ApiClient,
    pub(crate) cache: RwLock<ResourceCache>,
    pub(crate) progress: Option<ProgressCallback>,
}

impl QuqiFileSystem {
    /// Create an adapter with only the root cached. Performs no I/O.
    pub fn new(config: ClientConfig, account: Account) -> Result<Self> {
        let cache = ResourceCache::new(account.root_dir_id);
        Ok(Self {
            api: ApiClient::new(config, account)?,
            cache: RwLock::new(cache),
            progress: None,
        })
    }

    /// Reuse an existing cache, e.g. one restored from disk.
    pub(crate) fn with_cache(
        config: ClientConfig,
        account: Account,
        cache: ResourceCache,
    ) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(config, account)?,
            cache: RwLock::new(cache),
            progress: None,
        })
    }

    /// Report upload progress to `callback`.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Log in. Must succeed before any remote operation.
    pub async fn connect(&self) -> Result<()> {
        self.api.login().await
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn account(&self) -> &Account {
        self.api.session().account()
    }

    pub fn root_dir_id(&self) -> u64 {
        self.account().root_dir_id
    }

    /// Snapshot of the cached entry at `path`, without any remote call.
    pub async fn cached(&self, path: &str) -> Option<ResourceEntry> {
        self.cache.read().await.get(&normalize_path(path)).cloned()
    }

    /// Number of cached paths, root included.
    pub async fn cached_len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Properties stored for `path`; empty when the path is not cached.
    pub async fn properties(&self, path: &str) -> BTreeMap<String, String> {
        self.cached(path)
            .await
            .map(|entry| entry.properties)
            .unwrap_or_default()
    }

    pub async fn set_property(&self, path: &str, name: &str, value: &str) -> Result<()> {
        self.with_entry_mut(path, |entry| {
            entry.properties.insert(name.to_string(), value.to_string());
        })
        .await
    }

    pub async fn remove_property(&self, path: &str, name: &str) -> Result<Option<String>> {
        self.with_entry_mut(path, |entry| entry.properties.remove(name))
            .await
    }

    /// Locks stored for `path`; empty when the path is not cached.
    pub async fn locks(&self, path: &str) -> Vec<LockRecord> {
        self.cached(path)
            .await
            .map(|entry| entry.locks)
            .unwrap_or_default()
    }

    /// Store a lock, replacing any with the same token.
    pub async fn add_lock(&self, path: &str, lock: LockRecord) -> Result<()> {
        self.with_entry_mut(path, |entry| {
            entry.locks.retain(|l| l.token != lock.token);
            entry.locks.push(lock);
        })
        .await
    }

    /// Drop the lock with `token`; returns whether one was held.
    pub async fn remove_lock(&self, path: &str, token: &str) -> Result<bool> {
        self.with_entry_mut(path, |entry| {
            let before = entry.locks.len();
            entry.locks.retain(|l| l.token != token);
            entry.locks.len() != before
        })
        .await
    }

    async fn with_entry_mut<T>(
        &self,
        path: &str,
        apply: impl FnOnce(&mut ResourceEntry) -> T,
    ) -> Result<T> {
        let path = normalize_path(path);
        let mut cache = self.cache.write().await;
        let entry = cache
            .get_mut(&path)
            .ok_or_else(|| QuqiError::NotFound(path.clone()))?;
        Ok(apply(entry))
    }
}

impl std::fmt::Debug for QuqiFileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuqiFileSystem")
            .field("api", &self.api)
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}
