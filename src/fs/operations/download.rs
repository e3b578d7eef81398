//! Download operations.

use std::path::Path;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::error::{QuqiError, Result};
use crate::fs::contract::ReadStream;
use crate::fs::filesystem::QuqiFileSystem;
use crate::fs::path::normalize_path;

impl QuqiFileSystem {
    /// Open a file for reading as a byte stream straight from the service.
    pub async fn open_read(&self, path: &str) -> Result<ReadStream> {
        let path = normalize_path(path);
        let entry = self.resolve(&path).await?;
        if entry.is_directory() {
            return Err(QuqiError::Unsupported(format!("reading directory {}", path)));
        }
        tracing::debug!("downloading {} (node {})", path, entry.node_id);
        self.api.download(entry.node_id).await
    }

    /// Download a file to a local path.
    ///
    /// # Returns
    /// Number of bytes written.
    pub async fn download_to_file<P: AsRef<Path>>(&self, path: &str, local: P) -> Result<u64> {
        let mut stream = self.open_read(path).await?;
        let mut file = tokio::fs::File::create(local.as_ref()).await?;
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}
