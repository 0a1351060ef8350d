//! # File Mode
//!
//! Unix permission bits for planned artifacts, rendered and parsed in the
//! four-digit octal form used throughout configuration (`"0644"`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Permission bits of a planned file (the low 12 bits of `st_mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileMode(u32);

impl FileMode {
    /// World-readable certificate mode.
    pub const CERT: FileMode = FileMode(0o644);
    /// Owner-only private key mode.
    pub const KEY: FileMode = FileMode(0o600);

    /// Create a mode from raw bits. Returns `None` outside `0..=0o7777`.
    pub fn new(bits: u32) -> Option<Self> {
        (bits <= 0o7777).then_some(Self(bits))
    }

    /// The raw permission bits.
    pub fn bits(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for FileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

/// Error parsing an octal mode string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid file mode {0:?}: expected octal digits such as \"0644\"")]
pub struct ParseModeError(pub String);

impl FromStr for FileMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        if digits.is_empty() || digits.len() > 4 {
            return Err(ParseModeError(s.to_string()));
        }
        u32::from_str_radix(digits, 8)
            .ok()
            .and_then(FileMode::new)
            .ok_or_else(|| ParseModeError(s.to_string()))
    }
}

impl Serialize for FileMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FileMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
