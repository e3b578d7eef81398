//! Content digests used for server-side deduplication.
//!
//! The server matches uploads by the MD5 (fast checksum) and SHA-256
//! (cryptographic checksum) of the full payload, both as lower-case hex.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{QuqiError, Result};

const READ_BUF_SIZE: usize = 64 * 1024;

/// Digest pair for one payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest {
    /// MD5, lower-case hex.
    pub checksum: String,
    /// SHA-256, lower-case hex.
    pub crypto_checksum: String,
}

/// Incremental hasher computing both digests in one pass.
pub struct ContentHasher {
    md5: md5::Context,
    sha: Sha256,
    len: u64,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self {
            md5: md5::Context::new(),
            sha: Sha256::new(),
            len: 0,
        }
    }

    /// Feed the next slice of the stream.
    pub fn update(&mut self, data: &[u8]) {
        self.md5.consume(data);
        self.sha.update(data);
        self.len += data.len() as u64;
    }

    /// Bytes consumed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn finalize(self) -> ContentDigest {
        ContentDigest {
            checksum: format!("{:x}", self.md5.compute()),
            crypto_checksum: hex::encode(self.sha.finalize()),
        }
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash an in-memory payload.
pub fn hash_bytes(data: &[u8]) -> ContentDigest {
    let mut hasher = ContentHasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Hash everything a reader yields, in order. Returns the digest and byte count.
pub fn hash_reader<R: Read>(mut reader: R) -> Result<(ContentDigest, u64)> {
    let mut hasher = ContentHasher::new();
    let mut buffer = vec![0u8; READ_BUF_SIZE];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    let len = hasher.len();
    Ok((hasher.finalize(), len))
}

/// Hash a local file on the blocking pool so large payloads never stall the runtime.
pub async fn hash_file(path: &Path) -> Result<(ContentDigest, u64)> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || hash_reader(File::open(path)?))
        .await
        .map_err(|e| QuqiError::Custom(format!("Hash task failed: {}", e)))?
}
