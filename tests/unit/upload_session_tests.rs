/*!
 * Tests for the multipart upload session state machine
 *
 * Sessions move Idle -> Initiated -> Uploading -> Completed on success, or
 * to Aborted/Failed on part failure, cancel or endpoint failure. Complete
 * is only ever called with a full, ascending part list, and an aborted
 * session never accepts further work.
 */

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use lingoflow::RetryPolicy;
use lingoflow::errors::UploadError;
use lingoflow::upload::{MultipartUploadSession, SessionSettings, UploadState};

use crate::common::mock_remote::{MockPartTransport, MockStorageIssuer};

fn settings(chunk_size: usize, concurrency: usize, retries: u32) -> SessionSettings {
    SessionSettings {
        chunk_size,
        concurrency,
        retry: RetryPolicy::new(retries, 0),
    }
}

fn session_with(
    issuer: &Arc<MockStorageIssuer>,
    transport: &Arc<MockPartTransport>,
    settings: SessionSettings,
) -> MultipartUploadSession {
    MultipartUploadSession::new(
        Arc::clone(issuer) as Arc<dyn lingoflow::upload::StorageIssuer>,
        Arc::clone(transport) as Arc<dyn lingoflow::upload::PartTransport>,
        settings,
    )
}

#[tokio::test]
async fn test_upload_withHealthyRemotes_shouldCompleteWithSortedContiguousParts() {
    let issuer = Arc::new(MockStorageIssuer::new());
    let transport = Arc::new(MockPartTransport::new());
    let mut session = session_with(&issuer, &transport, settings(4, 2, 3));

    let data = Bytes::from(vec![1u8; 10]); // 3 chunks of 4, 4, 2 bytes
    let completed = session.upload("video.mp4", data, |_| {}).await.unwrap();

    assert_eq!(session.state(), UploadState::Completed);
    assert_eq!(completed.total_parts, 3);
    assert_eq!(completed.total_bytes, 10);

    let parts = issuer.completed_parts().expect("complete called once");
    let numbers: Vec<u32> = parts.iter().map(|p| p.part_number).collect();
    assert_eq!(numbers, vec![1, 2, 3], "sorted ascending, one per chunk");
    assert!(issuer.aborted.lock().is_empty());
}

#[tokio::test]
async fn test_upload_shouldReportMonotonicProgressForEveryChunk() {
    let issuer = Arc::new(MockStorageIssuer::new());
    let transport = Arc::new(MockPartTransport::new());
    let mut session = session_with(&issuer, &transport, settings(4, 2, 3));

    let seen: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let data = Bytes::from(vec![1u8; 17]); // 5 chunks
    session
        .upload("video.mp4", data, move |p| {
            sink.lock().push((p.completed_chunks, p.total_chunks));
        })
        .await
        .unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 5, "one report per settled chunk");
    assert!(seen.iter().all(|(_, total)| *total == 5));
    let counts: Vec<usize> = seen.iter().map(|(done, _)| *done).collect();
    let mut sorted = counts.clone();
    sorted.sort_unstable();
    assert_eq!(counts, sorted, "progress must be non-decreasing");
    assert_eq!(*counts.last().unwrap(), 5);
}

#[tokio::test]
async fn test_upload_withExhaustedPart_shouldAbortAndNeverComplete() {
    let issuer = Arc::new(MockStorageIssuer::new());
    let transport = Arc::new(MockPartTransport::new());
    // Part 2 always fails
    transport.fail_urls_containing("/2");
    let mut session = session_with(&issuer, &transport, settings(4, 3, 2));

    let data = Bytes::from(vec![1u8; 12]); // 3 chunks
    let error = session.upload("video.mp4", data, |_| {}).await.unwrap_err();

    assert!(matches!(error, UploadError::PartFailed { part_number: 2, .. }));
    assert_eq!(session.state(), UploadState::Aborted);
    assert!(issuer.completed.lock().is_empty(), "complete must never run");
    assert_eq!(issuer.aborted.lock().len(), 1);
}

#[tokio::test]
async fn test_upload_withPartRecoveringWithinBudget_shouldStillComplete() {
    let issuer = Arc::new(MockStorageIssuer::new());
    let transport = Arc::new(MockPartTransport::new());
    transport.fail_times(1);
    let mut session = session_with(&issuer, &transport, settings(4, 1, 3));

    let data = Bytes::from(vec![1u8; 8]); // 2 chunks
    session.upload("video.mp4", data, |_| {}).await.unwrap();

    assert_eq!(session.state(), UploadState::Completed);
    assert_eq!(transport.put_count(), 3, "one retry plus two successes");
    assert!(issuer.completed_parts().is_some());
}

#[tokio::test]
async fn test_upload_afterTerminalState_shouldRejectFurtherWork() {
    let issuer = Arc::new(MockStorageIssuer::new());
    let transport = Arc::new(MockPartTransport::new());
    let mut session = session_with(&issuer, &transport, settings(4, 2, 3));

    session
        .upload("video.mp4", Bytes::from(vec![1u8; 4]), |_| {})
        .await
        .unwrap();

    let error = session
        .upload("video.mp4", Bytes::from(vec![1u8; 4]), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(error, UploadError::InvalidState { .. }));
    assert_eq!(issuer.completed.lock().len(), 1, "no second finalize");
}

#[tokio::test]
async fn test_upload_withCancelledFlag_shouldAbortRemoteUpload() {
    let issuer = Arc::new(MockStorageIssuer::new());
    let transport = Arc::new(MockPartTransport::new());
    let mut session = session_with(&issuer, &transport, settings(4, 2, 3));

    session.cancel_flag().cancel();

    let error = session
        .upload("video.mp4", Bytes::from(vec![1u8; 12]), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(error, UploadError::Cancelled));
    assert_eq!(session.state(), UploadState::Aborted);
    assert_eq!(issuer.aborted.lock().len(), 1);
    assert!(issuer.completed.lock().is_empty());
    assert_eq!(transport.put_count(), 0, "no transfer may start");
}

#[tokio::test]
async fn test_upload_withInitiateFailure_shouldFailWithoutAborting() {
    let issuer = Arc::new(MockStorageIssuer::new());
    issuer.fail_initiate();
    let transport = Arc::new(MockPartTransport::new());
    let mut session = session_with(&issuer, &transport, settings(4, 2, 3));

    let error = session
        .upload("video.mp4", Bytes::from(vec![1u8; 8]), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(error, UploadError::InitiateFailed { .. }));
    assert_eq!(session.state(), UploadState::Failed);
    assert!(issuer.aborted.lock().is_empty(), "nothing to abort yet");
}

#[tokio::test]
async fn test_upload_withCompleteFailure_shouldAbortAndFail() {
    let issuer = Arc::new(MockStorageIssuer::new());
    issuer.fail_complete();
    let transport = Arc::new(MockPartTransport::new());
    let mut session = session_with(&issuer, &transport, settings(4, 2, 3));

    let error = session
        .upload("video.mp4", Bytes::from(vec![1u8; 8]), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(error, UploadError::CompleteFailed { .. }));
    assert_eq!(session.state(), UploadState::Failed);
    assert_eq!(issuer.aborted.lock().len(), 1);
}

#[tokio::test]
async fn test_upload_withFailingAbortEndpoint_shouldStillSurfaceOriginalError() {
    let issuer = Arc::new(MockStorageIssuer::new());
    issuer.fail_abort();
    let transport = Arc::new(MockPartTransport::new());
    transport.fail_urls_containing("mock://");
    let mut session = session_with(&issuer, &transport, settings(4, 2, 1));

    let error = session
        .upload("video.mp4", Bytes::from(vec![1u8; 8]), |_| {})
        .await
        .unwrap_err();

    // The abort failure is logged and swallowed; the part failure wins
    assert!(matches!(error, UploadError::PartFailed { .. }));
    assert_eq!(session.state(), UploadState::Aborted);
}

#[tokio::test]
async fn test_upload_withPartUrlFailure_shouldAbortSession() {
    let issuer = Arc::new(MockStorageIssuer::new());
    issuer.fail_part_url();
    let transport = Arc::new(MockPartTransport::new());
    let mut session = session_with(&issuer, &transport, settings(4, 2, 3));

    let error = session
        .upload("video.mp4", Bytes::from(vec![1u8; 8]), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(error, UploadError::PartUrlFailed { .. }));
    assert_eq!(session.state(), UploadState::Aborted);
    assert_eq!(transport.put_count(), 0);
}
