//! Typed `data` payloads, one per endpoint.
//!
//! The service is loose about scalar types (ids arrive as numbers or strings,
//! flags as booleans or 0/1), so the helpers in this module accept both.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Login reply.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    #[serde(deserialize_with = "flexible_string")]
    pub session_key: String,
    #[serde(deserialize_with = "flexible_string")]
    pub passport_id: String,
}

/// Directory listing: subdirectories and files of one node.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirListing {
    #[serde(default)]
    pub dir: Vec<DirItem>,
    #[serde(default)]
    pub file: Vec<FileItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirItem {
    #[serde(deserialize_with = "flexible_u64")]
    pub nid: u64,
    #[serde(default, deserialize_with = "flexible_u64")]
    pub parent_id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub add_time: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileItem {
    #[serde(deserialize_with = "flexible_u64")]
    pub nid: u64,
    #[serde(default, deserialize_with = "flexible_u64")]
    pub parent_id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub add_time: i64,
    #[serde(default, deserialize_with = "flexible_u64")]
    pub size: u64,
    #[serde(default)]
    pub filetype: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
}

/// File type the service assigns when the extension carries no meaning.
pub const DEFAULT_FILETYPE: &str = "q-default";

impl FileItem {
    /// Name as shown to clients: the stored name plus `.ext`, unless the file
    /// has no meaningful extension.
    pub fn display_name(&self) -> String {
        let typed = self.filetype.as_deref() != Some(DEFAULT_FILETYPE);
        match self.ext.as_deref() {
            Some(ext) if typed && !ext.is_empty() => format!("{}.{}", self.name, ext),
            _ => self.name.clone(),
        }
    }
}

/// Reply to mkdir.
#[derive(Debug, Clone, Deserialize)]
pub struct MkdirData {
    #[serde(deserialize_with = "flexible_u64")]
    pub node_id: u64,
}

/// Metadata for one node.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeStat {
    #[serde(alias = "node_id", deserialize_with = "flexible_u64")]
    pub nid: u64,
    #[serde(default, deserialize_with = "flexible_u64")]
    pub parent_id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub add_time: i64,
    #[serde(default, deserialize_with = "flexible_u64")]
    pub size: u64,
}

/// Reply to upload init: which branch of the upload protocol to take.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadInit {
    /// Content already stored server-side; nothing to transfer.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub exist: bool,
    #[serde(default, deserialize_with = "option_flexible_u64")]
    pub node_id: Option<u64>,
    /// Present when the server requires a chunked upload.
    #[serde(default, deserialize_with = "option_flexible_string")]
    pub upload_id: Option<String>,
    /// Upload host for both direct and chunked transfers.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "option_flexible_string")]
    pub token: Option<String>,
    #[serde(default, deserialize_with = "option_flexible_string")]
    pub task_id: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

/// Reply carrying the node created by an upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedNode {
    #[serde(deserialize_with = "flexible_u64")]
    pub node_id: u64,
}

fn scalar_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn scalar_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn flexible_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(d)?;
    if value.is_null() {
        return Ok(0);
    }
    scalar_u64(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected an id, got {}", value)))
}

pub(crate) fn flexible_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(d)?;
    match &value {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom("integer out of range")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got {}", s))),
        other => Err(serde::de::Error::custom(format!(
            "expected an integer, got {}",
            other
        ))),
    }
}

fn option_flexible_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(scalar_u64(&value).filter(|id| *id != 0))
}

pub(crate) fn flexible_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = Value::deserialize(d)?;
    scalar_string(value).ok_or_else(|| serde::de::Error::custom("expected a string"))
}

fn option_flexible_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(scalar_string(value).filter(|s| !s.is_empty()))
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0" || s == "false"),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_parses_mixed_scalars() {
        let listing: DirListing = serde_json::from_value(json!({
            "dir": [{"nid": "12", "parent_id": 3, "name": "docs", "add_time": 1622171281}],
            "file": [{"nid": 13, "parent_id": "3", "name": "a", "add_time": "1622171282",
                      "size": 10, "filetype": "image", "ext": "jpg"}]
        }))
        .unwrap();
        assert_eq!(listing.dir[0].nid, 12);
        assert_eq!(listing.dir[0].parent_id, 3);
        assert_eq!(listing.file[0].add_time, 1622171282);
        assert_eq!(listing.file[0].display_name(), "a.jpg");
    }

    #[test]
    fn test_listing_missing_collections() {
        let listing: DirListing = serde_json::from_value(json!({})).unwrap();
        assert!(listing.dir.is_empty());
        assert!(listing.file.is_empty());
    }

    #[test]
    fn test_display_name_rules() {
        let item = |filetype: Option<&str>, ext: Option<&str>| FileItem {
            nid: 1,
            parent_id: 0,
            name: "report".into(),
            add_time: 0,
            size: 0,
            filetype: filetype.map(str::to_string),
            ext: ext.map(str::to_string),
        };
        assert_eq!(item(Some("doc"), Some("pdf")).display_name(), "report.pdf");
        assert_eq!(item(None, Some("pdf")).display_name(), "report.pdf");
        assert_eq!(item(Some("q-default"), Some("bin")).display_name(), "report");
        assert_eq!(item(Some("doc"), Some("")).display_name(), "report");
        assert_eq!(item(Some("doc"), None).display_name(), "report");
    }

    #[test]
    fn test_upload_init_branches() {
        let hit: UploadInit = serde_json::from_value(json!({"exist": 1, "node_id": 99})).unwrap();
        assert!(hit.exist);
        assert_eq!(hit.node_id, Some(99));

        let chunked: UploadInit = serde_json::from_value(json!({
            "exist": false, "upload_id": "u-1", "url": "https://up", "task_id": 5
        }))
        .unwrap();
        assert!(!chunked.exist);
        assert_eq!(chunked.upload_id.as_deref(), Some("u-1"));
        assert_eq!(chunked.task_id.as_deref(), Some("5"));

        let simple: UploadInit =
            serde_json::from_value(json!({"upload_id": "", "token": "t", "url": "https://up"}))
                .unwrap();
        assert!(simple.upload_id.is_none());
        assert_eq!(simple.token.as_deref(), Some("t"));
    }

    #[test]
    fn test_login_numeric_passport() {
        let login: LoginData =
            serde_json::from_value(json!({"session_key": "abc", "passport_id": 123456})).unwrap();
        assert_eq!(login.passport_id, "123456");
        assert_eq!(login.session_key, "abc");
    }
}
