//! # Ensure State
//!
//! Whether an artifact should exist on disk or be removed.

use serde::{Deserialize, Serialize};

/// Desired lifecycle state of a planned artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsureState {
    /// The file exists with the planned content and metadata.
    #[default]
    Present,
    /// The file does not exist.
    Absent,
}

impl EnsureState {
    /// Returns the state identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }

    /// Whether the artifact should exist.
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present)
    }
}

impl std::fmt::Display for EnsureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
