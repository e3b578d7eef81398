//! Client configuration and account credentials.
//!
//! Both structs can be built in code, read from the environment, or (for
//! [`ClientConfig`]) loaded from a JSON file.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{QuqiError, Result};

/// Default remote API root.
pub const DEFAULT_BASE_URL: &str = "https://quqi.com";

/// Salt appended to the canonical query string when signing simple uploads.
pub const DEFAULT_UPLOAD_SALT: &str = "&9r2ktaB1kFEgodx5";

/// Default multipart part size (2 MiB).
pub const DEFAULT_PART_SIZE: u64 = 2 * 1024 * 1024;

/// Envelope code the service uses for an expired session.
pub const DEFAULT_SESSION_EXPIRED_CODE: i64 = 10003;

/// Transport and protocol settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Remote API root, without trailing slash.
    pub base_url: String,
    /// Salt for the simple-upload signature.
    pub upload_salt: String,
    /// Part size for chunked uploads, in bytes.
    pub part_size: u64,
    /// Per-request timeout in seconds.
    pub request_timeout: u64,
    /// Optional HTTP/SOCKS proxy URL.
    pub proxy: Option<String>,
    /// Directory for buffered upload payloads (OS temp dir when unset).
    pub temp_dir: Option<PathBuf>,
    /// Envelope code that triggers re-login and one retry.
    pub session_expired_code: i64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            upload_salt: DEFAULT_UPLOAD_SALT.to_string(),
            part_size: DEFAULT_PART_SIZE,
            request_timeout: 30,
            proxy: None,
            temp_dir: None,
            session_expired_code: DEFAULT_SESSION_EXPIRED_CODE,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `QUQI_BASE_URL`, `QUQI_PROXY`, `QUQI_TEMP_DIR`
    /// and `QUQI_PART_SIZE` when set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(url) = env::var("QUQI_BASE_URL") {
            config = config.with_base_url(url);
        }
        if let Ok(proxy) = env::var("QUQI_PROXY") {
            config.proxy = Some(proxy);
        }
        if let Ok(dir) = env::var("QUQI_TEMP_DIR") {
            config.temp_dir = Some(PathBuf::from(dir));
        }
        if let Ok(size) = env::var("QUQI_PART_SIZE") {
            let size = size
                .parse::<u64>()
                .map_err(|e| QuqiError::Custom(format!("Invalid QUQI_PART_SIZE: {}", e)))?;
            config = config.with_part_size(size)?;
        }
        Ok(config)
    }

    /// Load a JSON config file; missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&json)?;
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        if config.part_size == 0 {
            return Err(QuqiError::Custom("part_size must be positive".to_string()));
        }
        Ok(config)
    }

    /// Point the client at another API root (tests, mirrors).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Route all requests through a proxy.
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Set the chunked-upload part size.
    pub fn with_part_size(mut self, part_size: u64) -> Result<Self> {
        if part_size == 0 {
            return Err(QuqiError::Custom("part_size must be positive".to_string()));
        }
        self.part_size = part_size;
        Ok(self)
    }

    /// Buffer upload payloads in this directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Full URL for an API path.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(env::temp_dir)
    }
}

/// Login material and the two fixed root identifiers of a drive.
///
/// `Debug` output never contains the password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Login name (phone number).
    pub username: String,
    /// Login secret.
    pub password: String,
    /// Cloud (quqi) identifier the drive lives in.
    pub cloud_id: u64,
    /// Node identifier of the directory exposed as `/`.
    pub root_dir_id: u64,
}

impl Account {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        cloud_id: u64,
        root_dir_id: u64,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            cloud_id,
            root_dir_id,
        }
    }

    /// Read `QUQI_ACCOUNT`, `QUQI_PASSWORD`, `QUQI_USER_ID` and `QUQI_ROOT_DIR_ID`.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| {
            env::var(name).map_err(|_| QuqiError::Custom(format!("{} is not set", name)))
        };
        let id = |name: &str| -> Result<u64> {
            var(name)?
                .parse::<u64>()
                .map_err(|e| QuqiError::Custom(format!("Invalid {}: {}", name, e)))
        };
        Ok(Self {
            username: var("QUQI_ACCOUNT")?,
            password: var("QUQI_PASSWORD")?,
            cloud_id: id("QUQI_USER_ID")?,
            root_dir_id: id("QUQI_ROOT_DIR_ID")?,
        })
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("cloud_id", &self.cloud_id)
            .field("root_dir_id", &self.root_dir_id)
            .finish()
    }
}
