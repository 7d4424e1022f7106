/*!
 * Single-part upload with bounded retries.
 *
 * A part transfer is a binary PUT to a pre-obtained URL. The transport is a
 * trait so tests can stand in for the object store; the production
 * implementation uses reqwest. PartUploader wraps a transport with the
 * retry schedule and turns exhaustion into a typed error carrying the part
 * number and the last cause.
 */

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use log::warn;
use reqwest::Client;

use crate::errors::UploadError;
use crate::retry::RetryPolicy;

use super::chunk::Chunk;

/// A part of the file that has been successfully uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedPart {
    /// 1-based part number (chunk index + 1)
    pub part_number: u32,

    /// Content identifier returned by the store for this part
    pub etag: String,
}

/// Transport seam for a single part transfer.
///
/// Implementations perform one PUT attempt and return the store's content
/// identifier. They do not retry; retrying is the uploader's job.
#[async_trait]
pub trait PartTransport: Send + Sync + std::fmt::Debug {
    /// Transfer `data` to `url`, returning the part's content identifier
    async fn put(&self, url: &str, data: Bytes) -> Result<String, UploadError>;
}

/// HTTP transport performing the binary PUT against a presigned URL
#[derive(Debug, Clone)]
pub struct HttpPartTransport {
    /// HTTP client for part transfers
    client: Client,
}

impl HttpPartTransport {
    /// Create a new transport with the given request timeout
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl PartTransport for HttpPartTransport {
    async fn put(&self, url: &str, data: Bytes) -> Result<String, UploadError> {
        let response = self
            .client
            .put(url)
            .body(data)
            .send()
            .await
            .map_err(|e| UploadError::TransferFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(UploadError::TransferFailed(format!(
                "store responded with {}: {}",
                status, body
            )));
        }

        // The store must expose a content identifier per part; quotes around
        // the ETag value are part of the HTTP header, not the identifier.
        let etag = response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_matches('"').to_string())
            .filter(|v| !v.is_empty())
            .ok_or(UploadError::MissingContentId)?;

        Ok(etag)
    }
}

/// Uploads one chunk with bounded retries and exponential backoff
#[derive(Debug, Clone)]
pub struct PartUploader {
    /// Transport performing individual transfer attempts
    transport: Arc<dyn PartTransport>,

    /// Retry schedule for failed attempts
    policy: RetryPolicy,
}

impl PartUploader {
    /// Create a new uploader over the given transport and retry policy
    pub fn new(transport: Arc<dyn PartTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Upload a chunk to its part URL.
    ///
    /// Transport failures, non-2xx responses and missing content identifiers
    /// are all retried the same way; the uploader cannot distinguish their
    /// cause from the response shape alone. Returns the uploaded part on
    /// success, or a `PartFailed` error carrying the last cause once the
    /// attempt budget is exhausted.
    pub async fn upload(&self, chunk: &Chunk, url: &str) -> Result<UploadedPart, UploadError> {
        let part_number = chunk.part_number();
        let mut attempt = 0u32;
        let mut last_error: Option<UploadError> = None;

        while self.policy.allows_retry(attempt) {
            if attempt > 0 {
                tokio::time::sleep(self.policy.delay_for(attempt - 1)).await;
            }

            match self.transport.put(url, chunk.data.clone()).await {
                Ok(etag) => {
                    return Ok(UploadedPart { part_number, etag });
                }
                Err(e) => {
                    warn!(
                        "Part {} transfer failed: {} - attempt {}/{}",
                        part_number,
                        e,
                        attempt + 1,
                        self.policy.max_attempts
                    );
                    last_error = Some(e);
                }
            }

            attempt += 1;
        }

        Err(UploadError::PartFailed {
            part_number,
            attempts: attempt,
            reason: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt was made".to_string()),
        })
    }
}
