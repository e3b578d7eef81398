//! Typed remote actions, one method per endpoint.

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use serde::de::IgnoredAny;

use crate::api::client::{ApiClient, Attempt};
use crate::api::envelope::Envelope;
use crate::api::types::{DirListing, MkdirData, NodeStat, UploadInit, UploadedNode};
use crate::crypto::ContentDigest;
use crate::error::{QuqiError, Result};
use crate::session::Credentials;

const LIST_PATH: &str = "/api/dir/ls";
const MKDIR_PATH: &str = "/api/dir/mkdir";
const RENAME_PATH: &str = "/api/node/rename";
const DELETE_PATH: &str = "/api/node/del";
const STAT_PATH: &str = "/api/node/stat";
const DOWNLOAD_PATH: &str = "/api/doc/download";
const UPLOAD_INIT_PATH: &str = "/api/upload/v1/file/init";
const UPLOAD_FINISH_PATH: &str = "/api/upload/v1/file/finish";

/// Raw download body.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

impl ApiClient {
    fn node_form(&self, node_id: u64) -> Vec<(&'static str, String)> {
        vec![
            ("quqi_id", self.cloud_id().to_string()),
            ("node_id", node_id.to_string()),
        ]
    }

    /// List the subdirectories and files of a directory node.
    pub async fn list_dir(&self, node_id: u64) -> Result<DirListing> {
        let form = self.node_form(node_id);
        self.call(LIST_PATH, Some(&form[..])).await
    }

    /// Create directory `name` under `parent_id`; returns the new node id.
    pub async fn mkdir(&self, parent_id: u64, name: &str) -> Result<u64> {
        let form = [
            ("quqi_id", self.cloud_id().to_string()),
            ("parent_id", parent_id.to_string()),
            ("name", name.to_string()),
        ];
        let data: MkdirData = self.call(MKDIR_PATH, Some(&form[..])).await?;
        Ok(data.node_id)
    }

    /// Give a node a new display name within its directory.
    pub async fn rename(&self, node_id: u64, new_name: &str) -> Result<()> {
        let mut form = self.node_form(node_id);
        form.push(("rename", new_name.to_string()));
        self.call::<IgnoredAny>(RENAME_PATH, Some(&form[..])).await?;
        Ok(())
    }

    pub async fn delete(&self, node_id: u64) -> Result<()> {
        let form = self.node_form(node_id);
        self.call::<IgnoredAny>(DELETE_PATH, Some(&form[..])).await?;
        Ok(())
    }

    pub async fn stat_node(&self, node_id: u64) -> Result<NodeStat> {
        let form = self.node_form(node_id);
        self.call(STAT_PATH, Some(&form[..])).await
    }

    /// Open the content of a file node as a byte stream.
    ///
    /// The endpoint answers either with the file body or, on failure, with a
    /// JSON envelope; the content type tells them apart.
    pub async fn download(&self, node_id: u64) -> Result<ByteStream> {
        let response = self
            .with_session_retry(DOWNLOAD_PATH, |creds| self.download_once(node_id, creds))
            .await?;
        Ok(response
            .bytes_stream()
            .map_err(QuqiError::TransportError)
            .boxed())
    }

    async fn download_once(
        &self,
        node_id: u64,
        creds: Credentials,
    ) -> Result<Attempt<reqwest::Response>> {
        let url = self.config().url(DOWNLOAD_PATH);
        let query = self.node_form(node_id);
        let response = self
            .http()
            .get(&url, Some(&creds.cookie()), &query)
            .await?;

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));
        if !is_json {
            return Ok(Attempt::Done(response));
        }

        let envelope = Envelope::parse(&response.bytes().await?)?;
        tracing::debug!("download of {} answered with envelope err={}", node_id, envelope.err);
        match self.settle(envelope)? {
            // A JSON success where a file body was expected.
            Attempt::Done(_) => Err(QuqiError::InvalidResponse),
            Attempt::SessionExpired(envelope) => Ok(Attempt::SessionExpired(envelope)),
        }
    }

    /// Negotiate an upload: dedup hit, direct upload or chunked upload.
    pub async fn upload_init(
        &self,
        parent_id: u64,
        file_name: &str,
        size: u64,
        digest: &ContentDigest,
    ) -> Result<UploadInit> {
        let form = [
            ("quqi_id", self.cloud_id().to_string()),
            ("parent_id", parent_id.to_string()),
            ("size", size.to_string()),
            ("file_name", file_name.to_string()),
            ("md5", digest.checksum.clone()),
            ("sha", digest.crypto_checksum.clone()),
            ("is_slice", "false".to_string()),
        ];
        self.call(UPLOAD_INIT_PATH, Some(&form[..])).await
    }

    /// Complete a chunked upload once every part is stored.
    pub async fn upload_finish(&self, task_id: &str, upload_id: &str, parts: u64) -> Result<u64> {
        let form = [
            ("quqi_id", self.cloud_id().to_string()),
            ("task_id", task_id.to_string()),
            ("upload_id", upload_id.to_string()),
            ("parts", parts.to_string()),
        ];
        let done: UploadedNode = self.call(UPLOAD_FINISH_PATH, Some(&form[..])).await?;
        Ok(done.node_id)
    }
}
