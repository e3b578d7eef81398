//! # quqifs
//!
//! Exposes a Quqi cloud drive as a hierarchical file tree.
//!
//! The drive addresses everything by numeric node ids. This crate keeps a
//! lazily populated path cache over those ids and translates path-based
//! operations into remote actions.
//!
//! ## Features
//!
//! - **Session**: password login, transparent one-shot re-login when the
//!   service reports an expired session.
//! - **Namespace**: list, stat, mkdir, rename within a directory, delete.
//!   Missing paths trigger a top-down reload of their ancestors.
//! - **Transfers**:
//!   - Streaming downloads.
//!   - Uploads with content-hash deduplication, direct signed uploads and
//!     chunked uploads for large payloads.
//!   - Progress tracking with custom callbacks.
//! - **Persistence**: the cache and account can be saved and restored.
//!
//! ## Example
//!
//! ```no_run
//! use quqifs::{Account, ClientConfig, QuqiFileSystem, ResourceKind};
//!
//! # async fn example() -> quqifs::Result<()> {
//! let fs = QuqiFileSystem::new(ClientConfig::from_env()?, Account::from_env()?)?;
//! fs.connect().await?;
//!
//! for path in fs.list_directory("/").await? {
//!     println!("{}", path);
//! }
//!
//! fs.create("/backup", ResourceKind::Directory).await?;
//! fs.upload("notes.txt", "/backup/notes.txt").await?;
//! fs.move_resource("/backup/notes.txt", "/backup/notes-old.txt").await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod crypto;
pub mod error;
pub mod fs;
pub mod http;
pub mod progress;
pub mod session;

// Re-export commonly used types
pub use api::ApiClient;
pub use config::{Account, ClientConfig};
pub use error::{QuqiError, Result};
pub use fs::{
    FileSystem, FileSystemBlob, LockRecord, QuqiFileSystem, ReadStream, ResourceEntry,
    ResourceKind, WriteStream,
};
pub use progress::{ProgressCallback, TransferProgress};
