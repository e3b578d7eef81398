//! Filesystem operations split into focused modules.

mod browse;
pub(crate) mod dir_ops;
mod download;
mod write;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time in whole seconds since the epoch.
pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
