//! Upload pipeline: hash, negotiate, then transfer.
//!
//! The server answers the negotiation with one of three branches:
//! the content already exists (nothing is sent), a direct signed upload of
//! the whole payload, or a chunked upload of numbered parts.

pub mod parts;

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::Body;
use reqwest::multipart::{Form, Part};
use tokio::io::{AsyncReadExt as _, AsyncSeekExt as _};
use tokio_util::io::ReaderStream;

use crate::api::ApiClient;
use crate::api::envelope::Envelope;
use crate::api::error::ApiErrorCode;
use crate::api::types::{UploadInit, UploadedNode};
use crate::crypto::{ContentDigest, hash_file, sign_params};
use crate::error::{QuqiError, Result};
use crate::progress::{ProgressCallback, TransferProgress};

pub use parts::{PartSpec, plan_parts};

const SIMPLE_UPLOAD_PATH: &str = "/upload/v1/simpleUpload";
const PART_UPLOAD_PATH: &str = "/upload/v1/multipart";

/// Which branch of the upload protocol ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    /// Server already held the content.
    Deduplicated,
    /// Whole payload in one signed request.
    Simple,
    /// Payload sent as `parts` numbered parts.
    Chunked { parts: u64 },
}

/// Result of a completed upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub mode: UploadMode,
    /// New node, when the server reported it.
    pub node_id: Option<u64>,
    /// Payload size
    pub size: u64,
    /// Payload bytes actually transferred
    pub bytes_sent: u64,
    pub digest: ContentDigest,
}

/// Drives one upload against the remote service.
///
/// The local payload is only read; removing it is up to the caller once the
/// outcome is confirmed.
pub struct UploadPipeline<'a> {
    api: &'a ApiClient,
    progress: Option<ProgressCallback>,
}

impl<'a> UploadPipeline<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self {
            api,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Upload the local file at `local` as `name` under directory `parent_id`.
    ///
    /// # Arguments
    /// * `parent_id` - Node id of the remote directory
    /// * `name` - Remote file name
    /// * `local` - Complete local payload
    pub async fn upload_file(
        &self,
        parent_id: u64,
        name: &str,
        local: &Path,
    ) -> Result<UploadOutcome> {
        let (digest, size) = hash_file(local).await?;
        tracing::debug!(
            "hashed {} ({} bytes) md5={} sha={}",
            name,
            size,
            digest.checksum,
            digest.crypto_checksum
        );

        let init = self.api.upload_init(parent_id, name, size, &digest).await?;

        if init.exist {
            tracing::info!("{} already stored remotely, skipping transfer", name);
            return Ok(UploadOutcome {
                mode: UploadMode::Deduplicated,
                node_id: init.node_id,
                size,
                bytes_sent: 0,
                digest,
            });
        }

        let (mode, node_id) = match init.upload_id.as_deref() {
            Some(upload_id) => {
                tracing::info!("chunked upload of {} ({} bytes)", name, size);
                self.upload_chunked(&init, upload_id, name, size, local)
                    .await?
            }
            None => {
                tracing::info!("direct upload of {} ({} bytes)", name, size);
                let node_id = self.upload_simple(&init, name, size, local).await?;
                (UploadMode::Simple, node_id)
            }
        };

        Ok(UploadOutcome {
            mode,
            node_id,
            size,
            bytes_sent: size,
            digest,
        })
    }

    async fn upload_simple(
        &self,
        init: &UploadInit,
        name: &str,
        size: u64,
        local: &Path,
    ) -> Result<Option<u64>> {
        let host = required(&init.url, "url")?;
        let params = vec![
            ("quqi_id", self.api.cloud_id().to_string()),
            ("token", init.token.clone().unwrap_or_default()),
            ("task_id", init.task_id.clone().unwrap_or_default()),
            ("is_dir", "0".to_string()),
            ("upload_time", unix_now().to_string()),
        ];
        let params = signed(params, &self.api.config().upload_salt);

        let mut form = Form::new();
        for (key, value) in &params {
            form = form.text(*key, value.clone());
        }
        let file = tokio::fs::File::open(local).await?;
        let body = Body::wrap_stream(ReaderStream::new(file));
        form = form.part(
            "file",
            Part::stream_with_length(body, size).file_name(name.to_string()),
        );

        let url = format!("{}{}", host.trim_end_matches('/'), SIMPLE_UPLOAD_PATH);
        let response = self.api.http().post_multipart(&url, &params, form).await?;
        let node_id = upload_reply(&response.bytes().await?)?;

        self.report(size, size, name);
        Ok(node_id)
    }

    async fn upload_chunked(
        &self,
        init: &UploadInit,
        upload_id: &str,
        name: &str,
        size: u64,
        local: &Path,
    ) -> Result<(UploadMode, Option<u64>)> {
        let host = required(&init.url, "url")?;
        let task_id = required(&init.task_id, "task_id")?;
        let url = format!("{}{}", host.trim_end_matches('/'), PART_UPLOAD_PATH);
        let parts = plan_parts(size, self.api.config().part_size);
        let total_parts = parts.len() as u64;

        let mut file = tokio::fs::File::open(local).await?;
        let mut sent = 0u64;

        for part in &parts {
            tracing::debug!("uploading part {}/{} of {}", part.number, total_parts, name);
            let body = read_part(&mut file, part).await?;

            let query = [
                ("upload_id", upload_id.to_string()),
                ("part_number", part.number.to_string()),
                ("key", init.key.clone().unwrap_or_default()),
                ("bucket", init.bucket.clone().unwrap_or_default()),
                ("region", init.region.clone().unwrap_or_default()),
                ("token", init.token.clone().unwrap_or_default()),
            ];
            let response = self.api.http().post_bytes(&url, &query, body).await?;
            upload_reply(&response.bytes().await?)?;

            sent += part.len;
            self.report(sent, size, name);
        }

        let node_id = self
            .api
            .upload_finish(task_id, upload_id, total_parts)
            .await?;
        Ok((UploadMode::Chunked { parts: total_parts }, Some(node_id)))
    }

    fn report(&self, done: u64, total: u64, name: &str) {
        if let Some(progress) = &self.progress {
            progress(&TransferProgress::new(done, total, name));
        }
    }
}

/// Append `sign` computed over `params`.
fn signed(mut params: Vec<(&'static str, String)>, salt: &str) -> Vec<(&'static str, String)> {
    let sign = sign_params(
        params.iter().map(|(k, v)| (*k, Some(v.as_str()))),
        salt,
    );
    params.push(("sign", sign));
    params
}

fn required<'s>(value: &'s Option<String>, field: &str) -> Result<&'s str> {
    value.as_deref().filter(|v| !v.is_empty()).ok_or_else(|| {
        tracing::warn!("upload negotiation reply lacks {}", field);
        QuqiError::InvalidResponse
    })
}

async fn read_part(file: &mut tokio::fs::File, part: &PartSpec) -> Result<Vec<u8>> {
    file.seek(std::io::SeekFrom::Start(part.offset)).await?;
    let len = usize::try_from(part.len)
        .map_err(|_| QuqiError::Custom(format!("part {} too large", part.number)))?;
    let mut buf = vec![0u8; len];
    file.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Inspect an upload host reply: an error envelope fails the upload, a
/// success envelope may carry the new node id. Non-JSON bodies count as
/// success.
fn upload_reply(body: &[u8]) -> Result<Option<u64>> {
    let Ok(envelope) = Envelope::parse(body) else {
        return Ok(None);
    };
    if !envelope.is_success() {
        return Err(ApiErrorCode::Other(envelope.err).into_error(envelope.err, &envelope.msg));
    }
    Ok(envelope
        .into_data::<UploadedNode>()
        .ok()
        .map(|node| node.node_id))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
