/*!
 * Resumable, bounded-concurrency multipart upload manager.
 *
 * The module is organized leaves-first:
 * - `chunk`: pure splitting of a byte source into fixed-size parts
 * - `part`: one-part transfer with bounded retries and backoff
 * - `wave`: fixed-size concurrent waves with fail-fast between waves
 * - `issuer`: presigned-URL issuer contract and its HTTP client
 * - `session`: the initiate -> upload -> complete/abort state machine
 */

pub mod chunk;
pub mod issuer;
pub mod part;
pub mod session;
pub mod wave;

// Re-export main types for easier usage
pub use chunk::{Chunk, DEFAULT_CHUNK_SIZE, MIN_CHUNK_SIZE, chunk_count, split_bytes};
pub use issuer::{HttpStorageIssuer, StorageIssuer};
pub use part::{HttpPartTransport, PartTransport, PartUploader, UploadedPart};
pub use session::{
    CompletedUpload, MultipartUploadSession, SessionSettings, UploadProgress, UploadState,
};
pub use wave::{CancelFlag, WaveScheduler};
