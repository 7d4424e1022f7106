/*!
 * Multipart upload session orchestration.
 *
 * A session drives one file through initiate -> wave-scheduled part
 * uploads -> complete, or aborts the remote upload on the first
 * exhausted-retry part failure or caller cancel. Sessions are one-shot: a
 * terminal state (completed, aborted, failed) never accepts further work,
 * so an aborted upload cannot be finalized later - retrying means a fresh
 * session.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use log::{info, warn};

use crate::errors::UploadError;
use crate::retry::RetryPolicy;

use super::chunk;
use super::issuer::StorageIssuer;
use super::part::{PartTransport, PartUploader, UploadedPart};
use super::wave::{CancelFlag, WaveScheduler};

/// Lifecycle state of an upload session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    /// Created, nothing sent yet
    Idle,
    /// Remote upload session opened
    Initiated,
    /// Part transfers in flight
    Uploading,
    /// All parts transferred and the upload finalized
    Completed,
    /// Remote upload discarded after a failure or cancel
    Aborted,
    /// Terminal failure outside the normal abort path
    Failed,
}

impl UploadState {
    /// Whether the session has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Failed)
    }
}

impl std::fmt::Display for UploadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Initiated => "initiated",
            Self::Uploading => "uploading",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Progress snapshot reported after each chunk settles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    /// Chunks uploaded so far
    pub completed_chunks: usize,

    /// Total chunks in this session
    pub total_chunks: usize,
}

/// Summary of a finalized upload
#[derive(Debug, Clone)]
pub struct CompletedUpload {
    /// Object name the file was stored under
    pub object_name: String,

    /// Remote upload session id
    pub upload_id: String,

    /// Number of parts transferred
    pub total_parts: usize,

    /// Total bytes transferred
    pub total_bytes: u64,
}

/// Settings for one upload session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Size of each part in bytes
    pub chunk_size: usize,

    /// Maximum concurrent part transfers
    pub concurrency: usize,

    /// Retry schedule for individual part transfers
    pub retry: RetryPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            chunk_size: chunk::DEFAULT_CHUNK_SIZE,
            concurrency: 3,
            retry: RetryPolicy::default(),
        }
    }
}

/// Orchestrates one multipart upload end to end
#[derive(Debug)]
pub struct MultipartUploadSession {
    issuer: Arc<dyn StorageIssuer>,
    uploader: PartUploader,
    scheduler: WaveScheduler,
    settings: SessionSettings,
    state: UploadState,
    cancel: CancelFlag,
}

impl MultipartUploadSession {
    /// Create a new idle session
    pub fn new(
        issuer: Arc<dyn StorageIssuer>,
        transport: Arc<dyn PartTransport>,
        settings: SessionSettings,
    ) -> Self {
        let uploader = PartUploader::new(transport, settings.retry.clone());
        let scheduler = WaveScheduler::new(settings.concurrency);
        Self {
            issuer,
            uploader,
            scheduler,
            settings,
            state: UploadState::Idle,
            cancel: CancelFlag::new(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Handle for cooperative cancellation.
    ///
    /// Cancelling prevents new waves from starting and aborts the remote
    /// upload; transfers already in flight run to completion.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Upload `data` as `object_name`, reporting progress after each chunk.
    ///
    /// On success the assembled part list, sorted ascending by part number,
    /// is submitted to the issuer's finalize endpoint. On any part failure
    /// or cancel the remote upload is discarded best-effort and the original
    /// error surfaces to the caller.
    pub async fn upload<F>(
        &mut self,
        object_name: &str,
        data: Bytes,
        on_progress: F,
    ) -> Result<CompletedUpload, UploadError>
    where
        F: Fn(UploadProgress) + Send + Sync + 'static,
    {
        if self.state != UploadState::Idle {
            return Err(UploadError::InvalidState {
                state: self.state.to_string(),
            });
        }

        let total_bytes = data.len() as u64;
        let upload_id = match self.issuer.initiate(object_name).await {
            Ok(id) => id,
            Err(e) => {
                self.state = UploadState::Failed;
                return Err(e);
            }
        };
        self.state = UploadState::Initiated;

        let chunks = chunk::split_bytes(&data, self.settings.chunk_size);
        let total_chunks = chunks.len();
        info!(
            "Uploading '{}' as {} part(s) of up to {} bytes (upload {})",
            object_name,
            total_chunks,
            self.settings.chunk_size,
            upload_id
        );

        self.state = UploadState::Uploading;

        let completed = Arc::new(AtomicUsize::new(0));
        let on_progress = Arc::new(on_progress);

        let tasks: Vec<_> = chunks
            .into_iter()
            .map(|chunk| {
                let issuer = Arc::clone(&self.issuer);
                let uploader = self.uploader.clone();
                let object_name = object_name.to_string();
                let upload_id = upload_id.clone();
                let completed = Arc::clone(&completed);
                let on_progress = Arc::clone(&on_progress);

                async move {
                    let url = issuer
                        .part_url(&object_name, &upload_id, chunk.part_number())
                        .await?;
                    let part = uploader.upload(&chunk, &url).await?;

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    on_progress(UploadProgress {
                        completed_chunks: done,
                        total_chunks,
                    });

                    Ok(part)
                }
            })
            .collect();

        let uploaded = match self.scheduler.run(tasks, &self.cancel).await {
            Ok(parts) => parts,
            Err(e) => {
                self.abort_remote(object_name, &upload_id).await;
                self.state = UploadState::Aborted;
                return Err(e);
            }
        };

        // One slot per chunk index, each written exactly once
        let mut slots: Vec<Option<UploadedPart>> = vec![None; total_chunks];
        for part in uploaded {
            let index = (part.part_number - 1) as usize;
            slots[index] = Some(part);
        }

        let mut parts = Vec::with_capacity(total_chunks);
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(part) => parts.push(part),
                None => {
                    // Every wave settled successfully, so an empty slot can
                    // only mean a bookkeeping bug; refuse to finalize
                    self.abort_remote(object_name, &upload_id).await;
                    self.state = UploadState::Failed;
                    return Err(UploadError::CompleteFailed {
                        upload_id,
                        reason: format!("missing uploaded part for chunk {}", index),
                    });
                }
            }
        }
        parts.sort_by_key(|p| p.part_number);

        if let Err(e) = self.issuer.complete(object_name, &upload_id, &parts).await {
            self.abort_remote(object_name, &upload_id).await;
            self.state = UploadState::Failed;
            return Err(e);
        }

        self.state = UploadState::Completed;
        info!(
            "Upload '{}' completed: {} part(s), {} byte(s)",
            object_name, total_chunks, total_bytes
        );

        Ok(CompletedUpload {
            object_name: object_name.to_string(),
            upload_id,
            total_parts: total_chunks,
            total_bytes,
        })
    }

    /// Best-effort remote abort: failures are logged, never retried
    async fn abort_remote(&self, object_name: &str, upload_id: &str) {
        if let Err(e) = self.issuer.abort(object_name, upload_id).await {
            warn!(
                "Failed to abort remote upload '{}' for '{}': {}",
                upload_id, object_name, e
            );
        } else {
            info!("Aborted remote upload '{}' for '{}'", upload_id, object_name);
        }
    }
}
