//! Envelope codec: the wire form of a [`Chunk`].
//!
//! # Envelope Format
//!
//! A single-line JSON object with exactly these fields:
//!
//! ```text
//! {"fileId":"900150983cd24fb0","fileName":"a.txt","totalChunks":3,
//!  "chunkIndex":0,"data":"<base64>","crc32":907060870}
//! ```
//!
//! `crc32` is the unsigned CRC-32 of the raw chunk bytes, written in decimal.
//! The codec carries it but does not check it against `data`; see
//! [`Chunk::verify_integrity`] for the receiver-side check.

use crate::chunk::Chunk;
use crate::error::{DecodeError, RenderError};

/// Serialize a chunk into envelope bytes for the symbol renderer.
///
/// # Errors
/// `RenderError::Encode` if serde_json rejects the chunk.
pub fn serialize(chunk: &Chunk) -> Result<Vec<u8>, RenderError> {
    serde_json::to_vec(chunk)
        .map_err(|e| RenderError::Encode(format!("failed to serialize chunk envelope: {e}")))
}

/// Parse envelope bytes back into a chunk.
///
/// # Errors
/// `DecodeError::MalformedEnvelope` on invalid JSON, a missing or unknown
/// field, a type mismatch, a zero chunk count, or an index outside the count.
pub fn deserialize(bytes: &[u8]) -> Result<Chunk, DecodeError> {
    let chunk: Chunk = serde_json::from_slice(bytes)
        .map_err(|e| DecodeError::MalformedEnvelope(e.to_string()))?;

    if chunk.total_chunks() == 0 {
        return Err(DecodeError::MalformedEnvelope(
            "totalChunks must be at least 1".to_string(),
        ));
    }
    if chunk.chunk_index() >= chunk.total_chunks() {
        return Err(DecodeError::MalformedEnvelope(format!(
            "chunkIndex {} >= totalChunks {}",
            chunk.chunk_index(),
            chunk.total_chunks()
        )));
    }

    Ok(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::split;
    use serde_json::Value;

    fn sample_chunk() -> Chunk {
        split(b"hello", "hello.txt", 1024).unwrap().remove(0)
    }

    #[test]
    fn test_serialize_field_names_and_values() {
        let bytes = serialize(&sample_chunk()).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj.len(), 6);
        assert_eq!(obj["fileId"], "5d41402abc4b2a76");
        assert_eq!(obj["fileName"], "hello.txt");
        assert_eq!(obj["totalChunks"], 1);
        assert_eq!(obj["chunkIndex"], 0);
        assert_eq!(obj["data"], "aGVsbG8=");
        assert_eq!(obj["crc32"], 907060870u64);
    }

    #[test]
    fn test_serialize_keeps_field_order() {
        let text = String::from_utf8(serialize(&sample_chunk()).unwrap()).unwrap();
        let order: Vec<usize> = ["fileId", "fileName", "totalChunks", "chunkIndex", "data", "crc32"]
            .iter()
            .map(|k| text.find(&format!("\"{k}\"")).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert!(!text.contains('\n'));
    }

    #[test]
    fn test_deserialize_inverse() {
        let chunk = sample_chunk();
        let parsed = deserialize(&serialize(&chunk).unwrap()).unwrap();
        assert_eq!(parsed, chunk);
    }

    #[test]
    fn test_serialize_every_chunk_of_a_split() {
        let chunks = split(&[0xFFu8; 3000], "a \"quoted\" name\n.bin", 1024).unwrap();
        for chunk in &chunks {
            let bytes = serialize(chunk).unwrap();
            assert!(!bytes.contains(&b'\n'));
            assert_eq!(&deserialize(&bytes).unwrap(), chunk);
        }
    }

    #[test]
    fn test_crc_above_i32_range() {
        let text = br#"{"fileId":"0011223344556677","fileName":"x","totalChunks":2,"chunkIndex":1,"data":"AA==","crc32":4294967295}"#;
        let chunk = deserialize(text).unwrap();
        assert_eq!(chunk.integrity_tag(), u32::MAX);
    }

    #[test]
    fn test_missing_field() {
        let text = br#"{"fileId":"0011223344556677","fileName":"x","totalChunks":1,"chunkIndex":0,"data":"AA=="}"#;
        assert!(matches!(
            deserialize(text),
            Err(DecodeError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_extra_field() {
        let text = br#"{"fileId":"0011223344556677","fileName":"x","totalChunks":1,"chunkIndex":0,"data":"AA==","crc32":1,"extra":true}"#;
        assert!(deserialize(text).is_err());
    }

    #[test]
    fn test_type_mismatch() {
        let text = br#"{"fileId":"0011223344556677","fileName":"x","totalChunks":"1","chunkIndex":0,"data":"AA==","crc32":1}"#;
        assert!(deserialize(text).is_err());
    }

    #[test]
    fn test_index_out_of_range() {
        let text = br#"{"fileId":"0011223344556677","fileName":"x","totalChunks":1,"chunkIndex":1,"data":"AA==","crc32":1}"#;
        assert!(deserialize(text).is_err());
    }

    #[test]
    fn test_crc_not_enforced() {
        let text = br#"{"fileId":"0011223344556677","fileName":"x","totalChunks":1,"chunkIndex":0,"data":"AA==","crc32":1}"#;
        let chunk = deserialize(text).unwrap();
        assert!(!chunk.verify_integrity().unwrap());
    }
}
