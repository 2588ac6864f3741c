//! File splitting.
//!
//! Partitions file bytes into fixed-size [`Chunk`]s. Every chunk carries the
//! same file id, name and count, so a receiver that joins late or misses
//! symbols can still place whatever it captures.
//!
//! # Algorithm
//!
//! 1. Digest the whole content and keep the first 16 hex characters as the
//!    file id (random id if the digest is unavailable).
//! 2. `total = ceil(len / chunk_size)`.
//! 3. Chunk `i` covers `bytes[i * chunk_size .. min((i + 1) * chunk_size, len)]`.

use std::path::Path;

use tracing::{info, warn};

use crate::chunk::{Chunk, FileId, FILE_ID_LEN};
use crate::config::SenderConfig;
use crate::digest::{ContentDigest, Md5Digest};
use crate::error::SplitError;

/// How a file id was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileIdSource {
    /// Derived from the content digest; stable across runs.
    Content,
    /// Random fallback; a re-run yields a different id.
    Random,
}

/// Result of a successful split.
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub chunks: Vec<Chunk>,
    pub id_source: FileIdSource,
    pub file_size: usize,
}

/// Chunk splitter with a pluggable content digest.
pub struct Splitter {
    digest: Box<dyn ContentDigest>,
}

impl Default for Splitter {
    fn default() -> Self {
        Self::with_digest(Md5Digest)
    }
}

impl Splitter {
    pub fn with_digest(digest: impl ContentDigest + 'static) -> Self {
        Self {
            digest: Box::new(digest),
        }
    }

    /// Split `bytes` into chunks of `chunk_size`.
    ///
    /// # Errors
    /// - `SplitError::InvalidChunkSize` if `chunk_size` is zero
    /// - `SplitError::EmptyInput` if `bytes` is empty
    /// - `SplitError::TooManyChunks` if the count does not fit the envelope
    pub fn split(
        &self,
        bytes: &[u8],
        file_name: &str,
        chunk_size: usize,
    ) -> Result<SplitOutcome, SplitError> {
        if chunk_size == 0 {
            return Err(SplitError::InvalidChunkSize);
        }
        if bytes.is_empty() {
            return Err(SplitError::EmptyInput);
        }

        let total = bytes.len().div_ceil(chunk_size);
        let total_chunks = u32::try_from(total).map_err(|_| SplitError::TooManyChunks(total))?;

        let (file_id, id_source) = self.file_id(bytes)?;

        let chunks: Vec<Chunk> = bytes
            .chunks(chunk_size)
            .zip(0..total_chunks)
            .map(|(raw, index)| {
                Chunk::from_raw(
                    file_id.clone(),
                    file_name.to_string(),
                    total_chunks,
                    index,
                    raw,
                )
            })
            .collect();

        info!(
            file_name,
            file_id = %file_id,
            file_size = bytes.len(),
            total_chunks,
            "split file into chunks"
        );

        Ok(SplitOutcome {
            chunks,
            id_source,
            file_size: bytes.len(),
        })
    }

    fn file_id(&self, bytes: &[u8]) -> Result<(FileId, FileIdSource), SplitError> {
        let reason = match self.digest.digest(bytes) {
            Ok(digest) => match FileId::from_digest(&digest) {
                Some(id) => return Ok((id, FileIdSource::Content)),
                None => format!(
                    "{}-byte digest is too short for a {FILE_ID_LEN}-character id",
                    digest.len()
                ),
            },
            Err(SplitError::DigestUnavailable(reason)) => reason,
            Err(e) => return Err(e),
        };

        warn!(
            digest = self.digest.name(),
            %reason,
            "content digest unavailable, using a random file id; ids will not be stable across runs"
        );
        Ok((FileId::random(), FileIdSource::Random))
    }
}

/// Split with the default MD5 digest.
pub fn split(bytes: &[u8], file_name: &str, chunk_size: usize) -> Result<Vec<Chunk>, SplitError> {
    Splitter::default()
        .split(bytes, file_name, chunk_size)
        .map(|outcome| outcome.chunks)
}

/// Read a file and split it using `config.chunk_size`.
///
/// The chunk file name is the last component of `path`.
pub fn split_file(path: &Path, config: &SenderConfig) -> Result<SplitOutcome, SplitError> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Splitter::default().split(&bytes, &file_name, config.chunk_size)
}
