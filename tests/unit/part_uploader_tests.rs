/*!
 * Tests for single-part upload retries
 *
 * A part that fails fewer times than the attempt budget recovers; a part
 * that exhausts the budget surfaces a typed error carrying the part number
 * and the last cause.
 */

use std::sync::Arc;

use bytes::Bytes;
use lingoflow::RetryPolicy;
use lingoflow::errors::UploadError;
use lingoflow::upload::{PartUploader, split_bytes};

use crate::common::mock_remote::MockPartTransport;

fn one_chunk() -> lingoflow::upload::Chunk {
    let data = Bytes::from(vec![9u8; 16]);
    split_bytes(&data, 16).remove(0)
}

#[tokio::test]
async fn test_upload_withHealthyTransport_shouldReturnPart() {
    let transport = Arc::new(MockPartTransport::new());
    let uploader = PartUploader::new(transport.clone(), RetryPolicy::new(3, 0));

    let part = uploader.upload(&one_chunk(), "mock://u/1").await.unwrap();

    assert_eq!(part.part_number, 1);
    assert!(!part.etag.is_empty());
    assert_eq!(transport.put_count(), 1);
}

#[tokio::test]
async fn test_upload_failingFewerTimesThanBudget_shouldRecover() {
    let transport = Arc::new(MockPartTransport::new());
    transport.fail_times(2);
    let uploader = PartUploader::new(transport.clone(), RetryPolicy::new(3, 0));

    let part = uploader.upload(&one_chunk(), "mock://u/1").await.unwrap();

    assert_eq!(part.part_number, 1);
    assert_eq!(transport.put_count(), 3, "two failures plus one success");
}

#[tokio::test]
async fn test_upload_exhaustingBudget_shouldFailWithPartNumberAndAttempts() {
    let transport = Arc::new(MockPartTransport::new());
    transport.fail_times(10);
    let uploader = PartUploader::new(transport.clone(), RetryPolicy::new(3, 0));

    let error = uploader.upload(&one_chunk(), "mock://u/1").await.unwrap_err();

    match error {
        UploadError::PartFailed {
            part_number,
            attempts,
            reason,
        } => {
            assert_eq!(part_number, 1);
            assert_eq!(attempts, 3);
            assert!(reason.contains("scripted failure"));
        }
        other => panic!("expected PartFailed, got {:?}", other),
    }
    assert_eq!(transport.put_count(), 3);
}

#[tokio::test]
async fn test_upload_withMissingContentId_shouldRetryLikeTransportFailure() {
    let transport = Arc::new(MockPartTransport::new());
    transport.omit_etag_times(1);
    let uploader = PartUploader::new(transport.clone(), RetryPolicy::new(2, 0));

    let part = uploader.upload(&one_chunk(), "mock://u/1").await.unwrap();

    assert_eq!(transport.put_count(), 2);
    assert!(!part.etag.is_empty());
}
