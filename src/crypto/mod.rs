//! Content digests and upload request signing.

pub mod hash;
pub mod sign;

pub use hash::{ContentDigest, ContentHasher, hash_bytes, hash_file, hash_reader};
pub use sign::{query_string, sign_params};
