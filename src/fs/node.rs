//! Cached resource metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::types::{DirItem, FileItem, NodeStat};

/// Resource kind as the remote service models it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    File,
    Directory,
}

impl ResourceKind {
    pub fn is_directory(&self) -> bool {
        matches!(self, ResourceKind::Directory)
    }
}

/// A lock held on a resource by a protocol client.
///
/// Stored on behalf of the protocol layer; the adapter never inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub token: String,
    pub owner: Option<String>,
    pub exclusive: bool,
    /// Lock also covers descendants
    pub deep: bool,
    /// Lifetime in seconds, `None` for infinite
    pub timeout_secs: Option<u64>,
}

/// One known path: its remote node and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    /// Remote node identifier
    pub node_id: u64,
    pub kind: ResourceKind,
    /// Node identifier of the containing directory (0 for the root)
    pub parent_id: u64,
    /// Seconds since epoch, as reported remotely
    pub created_at: i64,
    /// Size in bytes (0 for directories)
    pub size: u64,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub locks: Vec<LockRecord>,
}

impl ResourceEntry {
    pub fn directory(node_id: u64, parent_id: u64, created_at: i64) -> Self {
        Self {
            node_id,
            kind: ResourceKind::Directory,
            parent_id,
            created_at,
            size: 0,
            properties: BTreeMap::new(),
            locks: Vec::new(),
        }
    }

    pub fn file(node_id: u64, parent_id: u64, created_at: i64, size: u64) -> Self {
        Self {
            kind: ResourceKind::File,
            size,
            ..Self::directory(node_id, parent_id, created_at)
        }
    }

    /// Entry for the drive root.
    pub fn root(node_id: u64) -> Self {
        Self::directory(node_id, 0, 0)
    }

    pub fn is_directory(&self) -> bool {
        self.kind.is_directory()
    }

    pub fn is_file(&self) -> bool {
        !self.is_directory()
    }

    /// Take over remote metadata from `fresh`, keeping the auxiliary state
    /// when both describe the same node.
    pub(crate) fn refresh_from(&mut self, fresh: ResourceEntry) {
        let same_node = self.node_id == fresh.node_id;
        let properties = std::mem::take(&mut self.properties);
        let locks = std::mem::take(&mut self.locks);
        *self = fresh;
        if same_node {
            self.properties = properties;
            self.locks = locks;
        }
    }

    /// Apply a remote stat reply.
    pub(crate) fn apply_stat(&mut self, stat: &NodeStat) {
        if stat.parent_id != 0 {
            self.parent_id = stat.parent_id;
        }
        if stat.add_time != 0 {
            self.created_at = stat.add_time;
        }
        if self.is_file() {
            self.size = stat.size;
        }
    }
}

impl From<&DirItem> for ResourceEntry {
    fn from(item: &DirItem) -> Self {
        ResourceEntry::directory(item.nid, item.parent_id, item.add_time)
    }
}

impl From<&FileItem> for ResourceEntry {
    fn from(item: &FileItem) -> Self {
        ResourceEntry::file(item.nid, item.parent_id, item.add_time, item.size)
    }
}
