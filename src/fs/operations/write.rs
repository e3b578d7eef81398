//! Write and upload operations.

use std::path::Path;

use tokio::io::AsyncWriteExt;

use crate::error::{QuqiError, Result};
use crate::fs::contract::WriteStream;
use crate::fs::filesystem::QuqiFileSystem;
use crate::fs::node::ResourceEntry;
use crate::fs::path::normalize_path;
use crate::fs::upload::{UploadOutcome, UploadPipeline};

use super::dir_ops::split;
use super::unix_now;

impl QuqiFileSystem {
    /// Open `path` for writing.
    ///
    /// The parent directory must resolve. Written bytes go to a local
    /// temporary file until [`commit_write`](Self::commit_write).
    pub async fn open_write(&self, path: &str) -> Result<WriteStream> {
        let path = normalize_path(path);
        let (parent, _) = split(&path)?;
        let parent_entry = self.resolve_dir(parent).await?;
        if let Some(existing) = self.cache.read().await.get(&path) {
            if existing.is_directory() {
                return Err(QuqiError::Unsupported(format!("writing to directory {}", path)));
            }
        }

        let temp_dir = self.api.config().temp_dir();
        tokio::fs::create_dir_all(&temp_dir).await?;
        WriteStream::new(path, parent_entry.node_id, &temp_dir)
    }

    /// Upload everything written to `stream` and cache the resulting file.
    ///
    /// The temporary file is removed afterwards, on success and on failure.
    pub async fn commit_write(&self, mut stream: WriteStream) -> Result<ResourceEntry> {
        let result = match stream.seal().await {
            Ok(()) => {
                self.upload_as(stream.parent_id, &stream.path, stream.temp_path())
                    .await
            }
            Err(e) => Err(e),
        };

        let path = stream.path.clone();
        if let Err(e) = stream.discard() {
            tracing::warn!("could not remove temporary file for {}: {}", path, e);
        }
        result
    }

    /// Write `data` to `path` in one go.
    pub async fn write_bytes(&self, path: &str, data: &[u8]) -> Result<ResourceEntry> {
        let mut stream = self.open_write(path).await?;
        stream.write_all(data).await?;
        self.commit_write(stream).await
    }

    /// Upload a local file to `path`. The local file is left in place.
    pub async fn upload<P: AsRef<Path>>(&self, local: P, path: &str) -> Result<ResourceEntry> {
        let path = normalize_path(path);
        let (parent, _) = split(&path)?;
        let parent_entry = self.resolve_dir(parent).await?;
        self.upload_as(parent_entry.node_id, &path, local.as_ref())
            .await
    }

    async fn upload_as(&self, parent_id: u64, path: &str, local: &Path) -> Result<ResourceEntry> {
        let (parent, name) = split(path)?;
        let outcome = UploadPipeline::new(&self.api)
            .with_progress(self.progress.clone())
            .upload_file(parent_id, name, local)
            .await?;
        tracing::info!(
            "uploaded {} via {:?} ({} of {} bytes sent)",
            path,
            outcome.mode,
            outcome.bytes_sent,
            outcome.size
        );
        self.record_upload(parent, path, parent_id, &outcome).await
    }

    /// Cache the uploaded file, re-listing its directory when the server
    /// did not say which node it created.
    async fn record_upload(
        &self,
        parent: &str,
        path: &str,
        parent_id: u64,
        outcome: &UploadOutcome,
    ) -> Result<ResourceEntry> {
        if let Some(node_id) = outcome.node_id {
            let entry = ResourceEntry::file(node_id, parent_id, unix_now(), outcome.size);
            self.cache.write().await.insert(path.to_string(), entry.clone());
            return Ok(entry);
        }

        tracing::debug!("upload of {} returned no node id, listing {}", path, parent);
        self.list_node(parent_id, parent).await?;
        self.cache
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| QuqiError::NotFound(path.to_string()))
    }
}
