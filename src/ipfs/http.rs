//! IPFS HTTP API client (kubo `/api/v0`).

use super::traits::{AddedFile, IpfsError, IpfsResult, PeerStorage};
use crate::config::IpfsConfig;
use crate::content_id::ContentId;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Client for an IPFS node or pinning service exposing the HTTP RPC API.
#[derive(Clone)]
pub struct IpfsHttpClient {
    base_url: String,
    http: reqwest::Client,
}

/// Raw `add` response line. kubo encodes `Size` as a decimal string.
#[derive(Debug, Deserialize)]
struct AddResponseLine {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Hash")]
    hash: String,
    #[serde(rename = "Size")]
    size: String,
}

impl IpfsHttpClient {
    pub fn new(config: &IpfsConfig) -> IpfsResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| IpfsError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v0/{}", self.base_url, path)
    }
}

fn map_send_error(e: reqwest::Error, timeout: Option<Duration>) -> IpfsError {
    match timeout {
        Some(t) if e.is_timeout() => IpfsError::Timeout(t),
        _ => IpfsError::Network(e.to_string()),
    }
}

async fn error_for_status(resp: reqwest::Response) -> IpfsResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(IpfsError::Http {
        status: status.as_u16(),
        body,
    })
}

/// Append a body chunk unless that would pass `max_size`.
fn append_limited(buf: &mut Vec<u8>, chunk: &[u8], max_size: usize) -> IpfsResult<()> {
    if buf.len() + chunk.len() > max_size {
        return Err(IpfsError::TooLarge { limit: max_size });
    }
    buf.extend_from_slice(chunk);
    Ok(())
}

/// Read a response body chunk by chunk, stopping once it passes `max_size`.
async fn read_limited(
    mut resp: reqwest::Response,
    max_size: usize,
    timeout: Duration,
) -> IpfsResult<Vec<u8>> {
    if resp
        .content_length()
        .is_some_and(|len| len > max_size as u64)
    {
        return Err(IpfsError::TooLarge { limit: max_size });
    }

    let mut buf = Vec::new();
    while let Some(chunk) = resp
        .chunk()
        .await
        .map_err(|e| map_send_error(e, Some(timeout)))?
    {
        append_limited(&mut buf, &chunk, max_size)?;
    }
    Ok(buf)
}

/// Parse the newline-delimited JSON body returned by `add`.
fn parse_add_response(body: &str) -> IpfsResult<Vec<AddedFile>> {
    let files = body
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let raw: AddResponseLine = serde_json::from_str(line)
                .map_err(|e| IpfsError::InvalidResponse(format!("{}: {}", e, line)))?;
            let size = raw
                .size
                .parse()
                .map_err(|_| IpfsError::InvalidResponse(format!("bad size: {}", raw.size)))?;
            Ok(AddedFile {
                path: raw.name,
                hash: raw.hash,
                size,
            })
        })
        .collect::<IpfsResult<Vec<_>>>()?;

    if files.is_empty() {
        return Err(IpfsError::InvalidResponse("empty add response".to_string()));
    }
    Ok(files)
}

#[async_trait]
impl PeerStorage for IpfsHttpClient {
    async fn cat(&self, cid: &ContentId, timeout: Duration) -> IpfsResult<Vec<u8>> {
        self.cat_limited(cid, timeout, usize::MAX).await
    }

    async fn cat_limited(
        &self,
        cid: &ContentId,
        timeout: Duration,
        max_size: usize,
    ) -> IpfsResult<Vec<u8>> {
        debug!(cid = %cid, ?timeout, max_size, "ipfs cat");

        let resp = self
            .http
            .post(self.endpoint("cat"))
            .query(&[("arg", cid.as_str())])
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_send_error(e, Some(timeout)))?;
        let resp = error_for_status(resp).await?;

        read_limited(resp, max_size, timeout).await
    }

    async fn add(&self, data: Vec<u8>) -> IpfsResult<Vec<AddedFile>> {
        debug!(size = data.len(), "ipfs add");

        let form = Form::new().part("file", Part::bytes(data).file_name("file"));
        let resp = self
            .http
            .post(self.endpoint("add"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| map_send_error(e, None))?;
        let resp = error_for_status(resp).await?;

        let body = resp
            .text()
            .await
            .map_err(|e| IpfsError::Network(e.to_string()))?;
        parse_add_response(&body)
    }
}
