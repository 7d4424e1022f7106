/*!
 * Presigned-URL issuer client.
 *
 * The object store is never addressed directly for session control; a
 * hosted issuer owns initiation, per-part URL signing, finalization and
 * abort. This module defines the trait the upload session depends on and
 * the JSON/HTTP implementation against the service API.
 */

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::UploadError;

use super::part::UploadedPart;

/// Remote collaborator that controls the lifecycle of a multipart upload
#[async_trait]
pub trait StorageIssuer: Send + Sync + std::fmt::Debug {
    /// Open a remote upload session, returning its upload id
    async fn initiate(&self, object_name: &str) -> Result<String, UploadError>;

    /// Obtain the transfer URL for one part
    async fn part_url(
        &self,
        object_name: &str,
        upload_id: &str,
        part_number: u32,
    ) -> Result<String, UploadError>;

    /// Finalize the upload. `parts` must be sorted ascending by part number
    /// with exactly one entry per part.
    async fn complete(
        &self,
        object_name: &str,
        upload_id: &str,
        parts: &[UploadedPart],
    ) -> Result<(), UploadError>;

    /// Discard the remote upload. Best-effort: callers log failures instead
    /// of retrying them.
    async fn abort(&self, object_name: &str, upload_id: &str) -> Result<(), UploadError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitiateRequest<'a> {
    object_name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitiateResponse {
    upload_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PartUrlRequest<'a> {
    object_name: &'a str,
    upload_id: &'a str,
    part_number: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartUrlResponse {
    part_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletedPartBody<'a> {
    part_number: u32,
    etag: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompleteRequest<'a> {
    object_name: &'a str,
    upload_id: &'a str,
    parts: Vec<CompletedPartBody<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AbortRequest<'a> {
    object_name: &'a str,
    upload_id: &'a str,
}

/// JSON/HTTP issuer client against the hosted service API
#[derive(Debug, Clone)]
pub struct HttpStorageIssuer {
    /// HTTP client for issuer calls
    client: Client,

    /// Base URL of the issuer API, without a trailing slash
    base_url: String,
}

impl HttpStorageIssuer {
    /// Create a new issuer client for the given API base URL
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, UploadError> {
        // Parse once up front so a malformed endpoint fails here rather
        // than on the first upload
        let parsed = Url::parse(endpoint).map_err(|e| UploadError::InitiateFailed {
            object_name: String::new(),
            reason: format!("invalid issuer endpoint '{}': {}", endpoint, e),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(UploadError::InitiateFailed {
                object_name: String::new(),
                reason: format!("issuer endpoint '{}' is not an HTTP base URL", endpoint),
            });
        }

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn route(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, String>
    where
        B: Serialize + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let url = self.route(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request to {} failed: {}", url, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(format!("issuer responded with {}: {}", status, text));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| format!("failed to parse issuer response: {}", e))
    }

    async fn post_json_no_body<B>(&self, path: &str, body: &B) -> Result<(), String>
    where
        B: Serialize + Sync,
    {
        let url = self.route(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request to {} failed: {}", url, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(format!("issuer responded with {}: {}", status, text));
        }

        Ok(())
    }
}

#[async_trait]
impl StorageIssuer for HttpStorageIssuer {
    async fn initiate(&self, object_name: &str) -> Result<String, UploadError> {
        let response: InitiateResponse = self
            .post_json("uploads/initiate", &InitiateRequest { object_name })
            .await
            .map_err(|reason| UploadError::InitiateFailed {
                object_name: object_name.to_string(),
                reason,
            })?;

        Ok(response.upload_id)
    }

    async fn part_url(
        &self,
        object_name: &str,
        upload_id: &str,
        part_number: u32,
    ) -> Result<String, UploadError> {
        let response: PartUrlResponse = self
            .post_json(
                "uploads/part-url",
                &PartUrlRequest {
                    object_name,
                    upload_id,
                    part_number,
                },
            )
            .await
            .map_err(|reason| UploadError::PartUrlFailed {
                part_number,
                reason,
            })?;

        Ok(response.part_url)
    }

    async fn complete(
        &self,
        object_name: &str,
        upload_id: &str,
        parts: &[UploadedPart],
    ) -> Result<(), UploadError> {
        let body = CompleteRequest {
            object_name,
            upload_id,
            parts: parts
                .iter()
                .map(|p| CompletedPartBody {
                    part_number: p.part_number,
                    etag: &p.etag,
                })
                .collect(),
        };

        self.post_json_no_body("uploads/complete", &body)
            .await
            .map_err(|reason| UploadError::CompleteFailed {
                upload_id: upload_id.to_string(),
                reason,
            })
    }

    async fn abort(&self, object_name: &str, upload_id: &str) -> Result<(), UploadError> {
        self.post_json_no_body(
            "uploads/abort",
            &AbortRequest {
                object_name,
                upload_id,
            },
        )
        .await
        .map_err(|reason| UploadError::AbortFailed {
            upload_id: upload_id.to_string(),
            reason,
        })
    }
}
