/*!
 * File system helpers.
 *
 * Reading media files into memory for upload, content hashing for stable
 * object names, and loading sentence transcripts (one sentence per line)
 * for task import.
 */

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use sha2::{Digest, Sha256};

/// Read a file fully into `Bytes` for chunked upload
pub async fn read_file_bytes(path: &Path) -> Result<Bytes> {
    if !path.is_file() {
        return Err(anyhow!("input path is not a file: {:?}", path));
    }

    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read file: {:?}", path))?;

    Ok(Bytes::from(data))
}

/// Hex-encoded SHA-256 of a byte slice
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Derive a stable object name from a file name and its content hash.
///
/// The hash prefix keeps repeated uploads of the same content addressable
/// under the same name while distinguishing different files that share a
/// file name.
pub fn object_name_for(path: &Path, data: &[u8]) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let hash = sha256_hex(data);

    format!("{}-{}{}", stem, &hash[..12], extension)
}

/// Load a sentence transcript: one sentence per line, blank lines skipped
pub async fn read_sentence_lines(path: &Path) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read transcript: {:?}", path))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
