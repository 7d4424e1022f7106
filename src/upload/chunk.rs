/*!
 * Chunk splitting for multipart uploads.
 *
 * Partitions a byte source into ordered, fixed-size ranges covering the
 * whole input with no gaps or overlaps. The last chunk may be shorter than
 * the configured chunk size.
 */

use bytes::Bytes;

/// Minimum part size accepted by S3-compatible object stores (5 MiB)
pub const MIN_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Default chunk size for multipart uploads (5 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = MIN_CHUNK_SIZE;

/// One contiguous byte range of a file, uploaded as an independent part
#[derive(Debug, Clone)]
pub struct Chunk {
    /// 0-based chunk index
    pub index: usize,

    /// Inclusive start offset within the source
    pub start: u64,

    /// Exclusive end offset within the source
    pub end: u64,

    /// The chunk's bytes (a zero-copy slice of the source)
    pub data: Bytes,
}

impl Chunk {
    /// Length of the chunk in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the chunk is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 1-based part number the object store expects for this chunk
    pub fn part_number(&self) -> u32 {
        self.index as u32 + 1
    }
}

/// Number of chunks a source of `total_len` bytes splits into
pub fn chunk_count(total_len: usize, chunk_size: usize) -> usize {
    assert!(chunk_size > 0, "chunk size must be positive");
    total_len.div_ceil(chunk_size)
}

/// Split a byte source into ordered fixed-size chunks covering `[0, len)`.
///
/// `Bytes` slicing is reference-counted, so no byte data is copied here.
/// A zero chunk size is a programmer error, not a recoverable condition.
pub fn split_bytes(data: &Bytes, chunk_size: usize) -> Vec<Chunk> {
    assert!(chunk_size > 0, "chunk size must be positive");

    let total = data.len();
    let count = chunk_count(total, chunk_size);
    let mut chunks = Vec::with_capacity(count);

    for index in 0..count {
        let start = index * chunk_size;
        let end = (start + chunk_size).min(total);
        chunks.push(Chunk {
            index,
            start: start as u64,
            end: end as u64,
            data: data.slice(start..end),
        });
    }

    chunks
}
