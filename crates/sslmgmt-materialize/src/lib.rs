//! # sslmgmt-materialize: Plan Materialization
//!
//! Converges [`ArtifactPlan`]s onto a filesystem.
//!
//! ## Design
//!
//! Resolution never touches the filesystem; this crate is the only place
//! that does. [`FileMaterializer`] is the seam: [`FsMaterializer`] writes
//! real files, [`RecordingMaterializer`] keeps an in-memory file table for
//! tests.
//!
//! Every `ensure` is idempotent. Ensuring the same artifact twice reports
//! [`Change::Unchanged`] the second time and leaves the file untouched.
//!
//! [`ArtifactPlan`]: sslmgmt_core::ArtifactPlan

pub mod apply;
pub mod error;
pub mod fs;
pub mod recording;

use sslmgmt_core::PlannedArtifact;

pub use apply::{apply_plan, AppliedChange, ApplyReport};
pub use error::{ApplyError, MaterializeError};
pub use fs::FsMaterializer;
pub use recording::{RecordedFile, RecordingMaterializer};

/// What ensuring one artifact did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    /// The file did not exist and was written.
    Created,
    /// The file existed with different content or attributes.
    Updated,
    /// The file already matched.
    Unchanged,
    /// The file existed and was deleted.
    Removed,
    /// The file should be absent and already was.
    AlreadyAbsent,
}

impl Change {
    /// Whether the filesystem was (or would be) modified.
    pub fn is_change(self) -> bool {
        matches!(self, Self::Created | Self::Updated | Self::Removed)
    }

    /// Lowercase label used in logs and command output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::Removed => "removed",
            Self::AlreadyAbsent => "already absent",
        }
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converges one planned artifact.
pub trait FileMaterializer {
    /// Make the target match `artifact` and report what changed.
    fn ensure(&self, artifact: &PlannedArtifact) -> Result<Change, MaterializeError>;
}

impl<T: FileMaterializer + ?Sized> FileMaterializer for &T {
    fn ensure(&self, artifact: &PlannedArtifact) -> Result<Change, MaterializeError> {
        (**self).ensure(artifact)
    }
}
