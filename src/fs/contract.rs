//! The operation set a file-access protocol layer drives.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tempfile::TempPath;
use tokio::io::AsyncWrite;

use crate::api::ByteStream;
use crate::error::Result;
use crate::fs::filesystem::QuqiFileSystem;
use crate::fs::node::{LockRecord, ResourceEntry, ResourceKind};

/// Content of a remote file.
pub type ReadStream = ByteStream;

/// Sink for the content of a file being written.
///
/// Bytes are buffered in a local temporary file, because the upload
/// protocol needs the total size and digests up front. Hand the stream back
/// to [`FileSystem::commit_write`] to upload it; the temporary file is
/// removed when the stream is dropped, whether or not the upload succeeded.
#[derive(Debug)]
pub struct WriteStream {
    pub(crate) path: String,
    pub(crate) parent_id: u64,
    file: tokio::fs::File,
    temp: TempPath,
    written: u64,
}

impl WriteStream {
    pub(crate) fn new(path: String, parent_id: u64, dir: &Path) -> Result<Self> {
        let (file, temp) = tempfile::Builder::new()
            .prefix("quqifs-upload-")
            .tempfile_in(dir)?
            .into_parts();
        Ok(Self {
            path,
            parent_id,
            file: tokio::fs::File::from_std(file),
            temp,
            written: 0,
        })
    }

    /// Destination path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Bytes buffered so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub(crate) fn temp_path(&self) -> &Path {
        &self.temp
    }

    /// Flush buffered bytes to the temporary file.
    pub(crate) async fn seal(&mut self) -> Result<()> {
        use tokio::io::AsyncWriteExt as _;
        self.file.flush().await?;
        self.file.sync_all().await?;
        Ok(())
    }

    /// Remove the temporary file, reporting failures.
    pub(crate) fn discard(self) -> Result<()> {
        let Self { file, temp, .. } = self;
        drop(file);
        temp.close()?;
        Ok(())
    }
}

impl AsyncWrite for WriteStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let poll = Pin::new(&mut self.file).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = poll {
            self.written += n as u64;
        }
        poll
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_shutdown(cx)
    }
}

/// Generic filesystem operations, each on a normalized path.
///
/// Per-resource properties and locks belong to the caller; the
/// implementation only stores them.
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn create(&self, path: &str, kind: ResourceKind) -> Result<()>;
    async fn delete(&self, path: &str) -> Result<()>;
    async fn move_resource(&self, from: &str, to: &str) -> Result<()>;
    async fn open_read(&self, path: &str) -> Result<ReadStream>;
    async fn open_write(&self, path: &str) -> Result<WriteStream>;
    /// Upload what was written and record the new resource.
    async fn commit_write(&self, stream: WriteStream) -> Result<ResourceEntry>;
    async fn size(&self, path: &str) -> Result<u64>;
    async fn creation_date(&self, path: &str) -> Result<i64>;
    async fn last_modified_date(&self, path: &str) -> Result<i64>;
    async fn resource_type(&self, path: &str) -> Result<ResourceKind>;
    async fn read_dir(&self, path: &str) -> Result<Vec<String>>;

    async fn properties(&self, path: &str) -> BTreeMap<String, String>;
    async fn set_property(&self, path: &str, name: &str, value: &str) -> Result<()>;
    async fn remove_property(&self, path: &str, name: &str) -> Result<Option<String>>;
    async fn locks(&self, path: &str) -> Vec<LockRecord>;
    async fn add_lock(&self, path: &str, lock: LockRecord) -> Result<()>;
    async fn remove_lock(&self, path: &str, token: &str) -> Result<bool>;
}

#[async_trait]
impl FileSystem for QuqiFileSystem {
    async fn create(&self, path: &str, kind: ResourceKind) -> Result<()> {
        QuqiFileSystem::create(self, path, kind).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        QuqiFileSystem::delete(self, path).await
    }

    async fn move_resource(&self, from: &str, to: &str) -> Result<()> {
        QuqiFileSystem::move_resource(self, from, to).await
    }

    async fn open_read(&self, path: &str) -> Result<ReadStream> {
        QuqiFileSystem::open_read(self, path).await
    }

    async fn open_write(&self, path: &str) -> Result<WriteStream> {
        QuqiFileSystem::open_write(self, path).await
    }

    async fn commit_write(&self, stream: WriteStream) -> Result<ResourceEntry> {
        QuqiFileSystem::commit_write(self, stream).await
    }

    async fn size(&self, path: &str) -> Result<u64> {
        QuqiFileSystem::size(self, path).await
    }

    async fn creation_date(&self, path: &str) -> Result<i64> {
        QuqiFileSystem::creation_date(self, path).await
    }

    async fn last_modified_date(&self, path: &str) -> Result<i64> {
        QuqiFileSystem::last_modified_date(self, path).await
    }

    async fn resource_type(&self, path: &str) -> Result<ResourceKind> {
        QuqiFileSystem::resource_type(self, path).await
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<String>> {
        self.list_directory(path).await
    }

    async fn properties(&self, path: &str) -> BTreeMap<String, String> {
        QuqiFileSystem::properties(self, path).await
    }

    async fn set_property(&self, path: &str, name: &str, value: &str) -> Result<()> {
        QuqiFileSystem::set_property(self, path, name, value).await
    }

    async fn remove_property(&self, path: &str, name: &str) -> Result<Option<String>> {
        QuqiFileSystem::remove_property(self, path, name).await
    }

    async fn locks(&self, path: &str) -> Vec<LockRecord> {
        QuqiFileSystem::locks(self, path).await
    }

    async fn add_lock(&self, path: &str, lock: LockRecord) -> Result<()> {
        QuqiFileSystem::add_lock(self, path, lock).await
    }

    async fn remove_lock(&self, path: &str, token: &str) -> Result<bool> {
        QuqiFileSystem::remove_lock(self, path, token).await
    }
}
