/*!
 * Tests for chunk splitting
 *
 * The splitter must cover the whole input with ordered, contiguous,
 * non-overlapping ranges whose lengths sum to the input length, with the
 * last chunk allowed to be short.
 */

use bytes::Bytes;
use lingoflow::upload::{MIN_CHUNK_SIZE, chunk_count, split_bytes};

#[test]
fn test_chunkCount_withVariousLengths_shouldEqualCeilDivision() {
    for (len, size, expected) in [
        (0usize, 5usize, 0usize),
        (1, 5, 1),
        (4, 5, 1),
        (5, 5, 1),
        (6, 5, 2),
        (10, 5, 2),
        (11, 5, 3),
    ] {
        assert_eq!(
            chunk_count(len, size),
            expected,
            "len={} size={}",
            len,
            size
        );
    }
}

#[test]
fn test_splitBytes_withTwelveMiBFileAndFiveMiBChunks_shouldProduceThreeChunks() {
    let data = Bytes::from(vec![0u8; 12 * 1024 * 1024]);
    let chunks = split_bytes(&data, MIN_CHUNK_SIZE);

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].len(), 5 * 1024 * 1024);
    assert_eq!(chunks[1].len(), 5 * 1024 * 1024);
    assert_eq!(chunks[2].len(), 2 * 1024 * 1024);
}

#[test]
fn test_splitBytes_rangesShouldCoverInputWithoutGapsOrOverlaps() {
    for (len, size) in [(1usize, 1usize), (17, 4), (100, 100), (101, 100), (999, 250)] {
        let data = Bytes::from(vec![42u8; len]);
        let chunks = split_bytes(&data, size);

        assert_eq!(chunks.len(), chunk_count(len, size));

        let mut cursor = 0u64;
        let mut total = 0usize;
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i, "chunks must be ordered by index");
            assert_eq!(chunk.start, cursor, "range must start where the last ended");
            assert!(chunk.end > chunk.start, "ranges must be non-empty");
            cursor = chunk.end;
            total += chunk.len();
        }
        assert_eq!(total, len, "chunk lengths must sum to the input length");
    }
}

#[test]
fn test_splitBytes_partNumbersShouldBeOneBasedAndContiguous() {
    let data = Bytes::from(vec![1u8; 33]);
    let chunks = split_bytes(&data, 10);

    let part_numbers: Vec<u32> = chunks.iter().map(|c| c.part_number()).collect();
    assert_eq!(part_numbers, vec![1, 2, 3, 4]);
}

#[test]
fn test_splitBytes_withEmptyInput_shouldProduceNoChunks() {
    let data = Bytes::new();
    let chunks = split_bytes(&data, 5);
    assert!(chunks.is_empty());
}
