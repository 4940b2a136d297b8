//! Integrity digests for bundled runtime archives.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha512};
use std::path::Path;

/// Newtype for a base64-encoded SHA-512 digest.
///
/// This is the integrity format consumers of a packed output expect in the
/// `.nupkg.sha512` sidecar, so the encoding is part of the type rather than
/// a detail of the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sha512Digest(String);

impl Sha512Digest {
    /// Compute the digest of a byte buffer.
    pub fn compute(data: &[u8]) -> Self {
        let digest = Sha512::digest(data);
        Self(STANDARD.encode(digest))
    }

    /// Compute the digest of a file by reading it entirely into memory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read.
    pub fn compute_file(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::compute(&data))
    }

    /// Return the base64 text as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sha512Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha512Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_the_known_digest() {
        let digest = Sha512Digest::compute(b"");
        assert_eq!(
            digest.as_str(),
            "z4PhNX7vuL3xVChQ1m2AB9Yg5AULVxXcg/SpIdNs6c5H0NE8XYXysP+DGNKHfuwvY7kxvUdBeoGlODJ6+SfaPg=="
        );
    }

    #[test]
    fn digest_is_deterministic() {
        let a = Sha512Digest::compute(b"runtime archive bytes");
        let b = Sha512Digest::compute(b"runtime archive bytes");
        assert_eq!(a, b);
        // 64 digest bytes encode to 88 base64 characters.
        assert_eq!(a.as_str().len(), 88);
    }

    #[test]
    fn file_and_buffer_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.nupkg");
        std::fs::write(&path, b"zipped runtime").unwrap();
        assert_eq!(
            Sha512Digest::compute_file(&path).unwrap(),
            Sha512Digest::compute(b"zipped runtime")
        );
    }
}
