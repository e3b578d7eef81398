//! Path namespace over the remote drive: cache, adapter and uploads.

pub mod cache;
pub mod contract;
mod filesystem;
pub mod node;
mod operations;
pub mod path;
pub mod state;
pub mod upload;

pub use cache::ResourceCache;
pub use contract::{FileSystem, ReadStream, WriteStream};
pub use filesystem::QuqiFileSystem;
pub use node::{LockRecord, ResourceEntry, ResourceKind};
pub use state::FileSystemBlob;
pub use upload::{UploadMode, UploadOutcome, UploadPipeline};
