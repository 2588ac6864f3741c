//! Content digest used to derive deterministic file identifiers.

use md5::{Digest, Md5};

use crate::error::SplitError;

/// Hashes a whole file's bytes.
///
/// Implementations may report [`SplitError::DigestUnavailable`]; the splitter
/// then falls back to a random identifier.
pub trait ContentDigest: Send + Sync {
    fn name(&self) -> &'static str;

    fn digest(&self, bytes: &[u8]) -> Result<Vec<u8>, SplitError>;
}

/// MD5 over the full content.
#[derive(Debug, Default, Clone, Copy)]
pub struct Md5Digest;

impl ContentDigest for Md5Digest {
    fn name(&self) -> &'static str {
        "md5"
    }

    fn digest(&self, bytes: &[u8]) -> Result<Vec<u8>, SplitError> {
        Ok(Md5::digest(bytes).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_known_vector() {
        let out = Md5Digest.digest(b"abc").unwrap();
        assert_eq!(hex::encode(out), "900150983cd24fb0d6963f7d28e17f72");
    }
}
