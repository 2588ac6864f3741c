//! The chunk entity: one addressable slice of a file plus its metadata.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Number of hex characters in a file identifier.
pub const FILE_ID_LEN: usize = 16;

/// Fixed-length lowercase hex identifier shared by every chunk of a file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileId(String);

impl FileId {
    /// Take the first [`FILE_ID_LEN`] hex characters of a digest.
    ///
    /// Returns `None` if the digest is too short to fill the id.
    pub fn from_digest(digest: &[u8]) -> Option<Self> {
        if digest.len() * 2 < FILE_ID_LEN {
            return None;
        }
        let mut hex = hex::encode(digest);
        hex.truncate(FILE_ID_LEN);
        Some(Self(hex))
    }

    /// Random id of the same length, for when no digest is available.
    pub fn random() -> Self {
        let bytes: [u8; FILE_ID_LEN / 2] = rand::thread_rng().gen();
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FileId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.len() != FILE_ID_LEN || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!(
                "fileId must be {FILE_ID_LEN} hex characters, got {value:?}"
            ));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }
}

impl From<FileId> for String {
    fn from(id: FileId) -> Self {
        id.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One independently transmittable slice of a file.
///
/// Chunks are built once by the splitter and never mutated; the fields are
/// only reachable through accessors. The serde layout is the wire envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Chunk {
    file_id: FileId,
    file_name: String,
    total_chunks: u32,
    chunk_index: u32,
    #[serde(rename = "data")]
    payload: String,
    #[serde(rename = "crc32")]
    integrity_tag: u32,
}

impl Chunk {
    /// Build a chunk from its raw slice. The payload is base64 of `raw` and
    /// the integrity tag is the CRC-32 of `raw`.
    pub(crate) fn from_raw(
        file_id: FileId,
        file_name: String,
        total_chunks: u32,
        chunk_index: u32,
        raw: &[u8],
    ) -> Self {
        Self {
            file_id,
            file_name,
            total_chunks,
            chunk_index,
            payload: STANDARD.encode(raw),
            integrity_tag: crc32fast::hash(raw),
        }
    }

    pub fn file_id(&self) -> &FileId {
        &self.file_id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }

    pub fn chunk_index(&self) -> u32 {
        self.chunk_index
    }

    /// Base64 text of the raw slice.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// CRC-32 of the raw slice.
    pub fn integrity_tag(&self) -> u32 {
        self.integrity_tag
    }

    /// Decode the payload back to raw bytes.
    pub fn decode_payload(&self) -> Result<Vec<u8>, DecodeError> {
        STANDARD
            .decode(&self.payload)
            .map_err(|e| DecodeError::MalformedEnvelope(format!("invalid base64 data: {e}")))
    }

    /// Receiver-side check of the carried CRC-32 against the decoded payload.
    ///
    /// The sender never calls this; the tag is transmitted as-is.
    pub fn verify_integrity(&self) -> Result<bool, DecodeError> {
        let raw = self.decode_payload()?;
        Ok(crc32fast::hash(&raw) == self.integrity_tag)
    }
}
