//! # Content Blobs
//!
//! Certificate and key material is opaque: it is never parsed, only copied
//! and concatenated. The one composition rule lives here.
//!
//! ## Composition
//!
//! A two-part artifact (cert then chain, or key then cert) is built by
//! [`Blob::concat`]. Each part is normalized to end in exactly one `\n`
//! before joining, so `"testcert\n"` and `"cacert\n"` become
//! `"testcert\ncacert\n"`, and a part stored without its final newline
//! still yields a well-formed bundle. Only `\n` is trimmed, so CRLF content
//! keeps its line endings. An empty part contributes nothing. The order of
//! the arguments is the order in the output; callers never reorder.

use sha2::{Digest, Sha256};

/// Opaque certificate or key bytes.
///
/// `Debug` prints only the length and digest so private keys never reach
/// log output.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Blob(Vec<u8>);

impl Blob {
    /// Wrap raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the blob holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Concatenate `first` then `second`, each terminated by exactly one
    /// newline. Parts that are empty after trimming are skipped.
    pub fn concat(first: &Blob, second: &Blob) -> Blob {
        let mut out = Vec::with_capacity(first.len() + second.len() + 2);
        for part in [first, second] {
            let trimmed = trim_trailing_newlines(part.as_bytes());
            if trimmed.is_empty() {
                continue;
            }
            out.extend_from_slice(trimmed);
            out.push(b'\n');
        }
        Blob(out)
    }

    /// Lowercase hex SHA-256 of the content.
    pub fn sha256_hex(&self) -> String {
        Sha256::digest(&self.0)
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    /// Consumes self and returns the inner bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

fn trim_trailing_newlines(bytes: &[u8]) -> &[u8] {
    let mut end = bytes.len();
    while end > 0 && bytes[end - 1] == b'\n' {
        end -= 1;
    }
    &bytes[..end]
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob")
            .field("len", &self.0.len())
            .field("sha256", &self.sha256_hex())
            .finish()
    }
}

impl From<String> for Blob {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&str> for Blob {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}
