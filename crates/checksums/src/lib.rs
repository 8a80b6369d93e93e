#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Content digest primitives for atomic-install.
//!
//! The install journal identifies each regular file by a 128-bit MD5 digest
//! over its data bytes. The digest is part of the journal's on-disk format
//! and exists for auditing and deduplication; collision resistance is not a
//! requirement, so MD5's cryptographic weakness is irrelevant here.
//!
//! [`digest_file`] streams a file through the hasher in 4 KiB chunks, so
//! arbitrarily large payloads hash in constant memory.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use md5::{Digest, Md5};

/// Read-chunk size used when digesting file contents.
const CHUNK_SIZE: usize = 4096;

/// 128-bit content fingerprint of a regular file.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct ContentDigest(pub [u8; 16]);

impl ContentDigest {
    /// Digest value used for records that carry no content (directories).
    pub const ZERO: Self = Self([0; 16]);

    /// Renders the digest as 32 lowercase hex digits.
    #[must_use]
    pub fn as_hex(&self) -> String {
        let mut out = String::with_capacity(32);
        for byte in self.0 {
            out.push(char::from_digit(u32::from(byte >> 4), 16).unwrap_or('0'));
            out.push(char::from_digit(u32::from(byte & 0x0f), 16).unwrap_or('0'));
        }
        out
    }
}

/// Streaming content hasher.
///
/// A thin wrapper over the RustCrypto MD5 state that yields a
/// [`ContentDigest`] on [`finish`](Hasher::finish).
#[derive(Clone, Debug, Default)]
pub struct Hasher {
    inner: Md5,
}

impl Hasher {
    /// Creates a hasher with empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds `data` into the digest.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalizes the digest.
    #[must_use]
    pub fn finish(self) -> ContentDigest {
        ContentDigest(self.inner.finalize().into())
    }
}

/// Computes the content digest of the regular file at `path`.
pub fn digest_file(path: &Path) -> io::Result<ContentDigest> {
    let mut file = File::open(path)?;
    let mut hasher = Hasher::new();
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finish())
}

/// Convenience for digesting an in-memory byte slice.
#[must_use]
pub fn digest_bytes(data: &[u8]) -> ContentDigest {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 1321 appendix A.5 test suite.
    #[test]
    fn rfc1321_vectors() {
        let cases: &[(&[u8], &str)] = &[
            (b"", "d41d8cd98f00b204e9800998ecf8427e"),
            (b"a", "0cc175b9c0f1b6a831c399e269772661"),
            (b"abc", "900150983cd24fb0d6963f7d28e17f72"),
            (b"message digest", "f96b697d7cb7938d525a2f31aaf161d0"),
            (
                b"abcdefghijklmnopqrstuvwxyz",
                "c3fcd3d76192e4007dfb496cca67e13b",
            ),
        ];

        for (input, expected) in cases {
            assert_eq!(digest_bytes(input).as_hex(), *expected);
        }
    }

    #[test]
    fn streaming_matches_one_shot() {
        let data = vec![0xa5u8; 3 * CHUNK_SIZE + 17];

        let mut hasher = Hasher::new();
        for chunk in data.chunks(CHUNK_SIZE) {
            hasher.update(chunk);
        }

        assert_eq!(hasher.finish(), digest_bytes(&data));
    }

    #[test]
    fn digest_file_streams_contents() {
        let temp = tempfile::tempdir().expect("create tempdir");
        let path = temp.path().join("payload");
        let data = vec![0x42u8; 2 * CHUNK_SIZE + 5];
        std::fs::write(&path, &data).expect("write payload");

        assert_eq!(digest_file(&path).expect("digest"), digest_bytes(&data));
    }

    #[test]
    fn zero_digest_renders_as_zero_hex() {
        assert_eq!(ContentDigest::ZERO.as_hex(), "0".repeat(32));
    }
}
