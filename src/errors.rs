/*!
 * Error types for the lingoflow crate.
 *
 * This module contains custom error types for different parts of the
 * application, using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when talking to a translation backend API
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that can occur during a multipart upload
#[derive(Error, Debug)]
pub enum UploadError {
    /// The session is not in a state that accepts the requested operation
    #[error("upload session is {state} and cannot accept new work")]
    InvalidState {
        /// Current session state
        state: String,
    },

    /// The issuer refused or failed to open a remote upload session
    #[error("failed to initiate multipart upload for '{object_name}': {reason}")]
    InitiateFailed {
        /// Object the upload was meant for
        object_name: String,
        /// Underlying cause
        reason: String,
    },

    /// No upload URL could be obtained for a part
    #[error("failed to obtain upload URL for part {part_number}: {reason}")]
    PartUrlFailed {
        /// 1-based part number
        part_number: u32,
        /// Underlying cause
        reason: String,
    },

    /// A part transfer failed after exhausting its retry budget
    #[error("part {part_number} failed after {attempts} attempts: {reason}")]
    PartFailed {
        /// 1-based part number
        part_number: u32,
        /// Attempts consumed, including the first
        attempts: u32,
        /// Last observed cause
        reason: String,
    },

    /// A transfer responded without the content identifier the store
    /// promises for each part
    #[error("upload response is missing a content identifier")]
    MissingContentId,

    /// A single transfer attempt failed (retried internally)
    #[error("part transfer failed: {0}")]
    TransferFailed(String),

    /// Finalizing the remote upload failed
    #[error("failed to finalize upload '{upload_id}': {reason}")]
    CompleteFailed {
        /// Remote upload session id
        upload_id: String,
        /// Underlying cause
        reason: String,
    },

    /// Aborting the remote upload failed (best-effort, normally only logged)
    #[error("failed to abort upload '{upload_id}': {reason}")]
    AbortFailed {
        /// Remote upload session id
        upload_id: String,
        /// Underlying cause
        reason: String,
    },

    /// The caller cancelled the session
    #[error("upload cancelled")]
    Cancelled,
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The backend returned a batch of the wrong shape
    #[error("translated batch has {got} entries, expected {expected}")]
    BatchShapeMismatch {
        /// Number of entries sent to the backend
        expected: usize,
        /// Number of entries it returned
        got: usize,
    },

    /// Error writing a result to the sentence store
    #[error("Store error: {0}")]
    Store(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the upload manager
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
