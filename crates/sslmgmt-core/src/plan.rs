//! # Artifact Plans
//!
//! The output of a resolution: an ordered list of files, each with its
//! path, ownership, mode, desired state and (when present) content.
//!
//! ## Invariants
//!
//! - Paths are unique within a plan. [`ArtifactPlan::push`] rejects a
//!   second artifact for a path already planned.
//! - `content` is `Some` exactly when the artifact is present.
//! - Order is the order artifacts should be materialized in.

use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::blob::Blob;
use crate::ensure::EnsureState;
use crate::entry::EntryKind;
use crate::error::ResolveError;
use crate::mode::FileMode;

/// Where a file goes and who owns it, before content is decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSpec {
    /// Absolute target path.
    pub path: PathBuf,
    /// Owning user name.
    pub owner: String,
    /// Owning group name.
    pub group: String,
    /// Permission bits.
    pub mode: FileMode,
}

/// One file the materializer must converge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedArtifact {
    /// Absolute target path.
    pub path: PathBuf,
    /// Whether the file should exist.
    pub ensure: EnsureState,
    /// File content; `None` for absent artifacts.
    #[serde(rename = "sha256", serialize_with = "serialize_digest")]
    pub content: Option<Blob>,
    /// Owning user name.
    pub owner: String,
    /// Owning group name.
    pub group: String,
    /// Permission bits.
    pub mode: FileMode,
}

fn serialize_digest<S: Serializer>(content: &Option<Blob>, s: S) -> Result<S::Ok, S::Error> {
    match content {
        Some(blob) => s.serialize_some(&blob.sha256_hex()),
        None => s.serialize_none(),
    }
}

impl PlannedArtifact {
    /// A present artifact at `spec` carrying `content`.
    pub fn present(spec: FileSpec, content: Blob) -> Self {
        Self {
            path: spec.path,
            ensure: EnsureState::Present,
            content: Some(content),
            owner: spec.owner,
            group: spec.group,
            mode: spec.mode,
        }
    }

    /// An absent artifact at `spec`.
    pub fn absent(spec: FileSpec) -> Self {
        Self {
            path: spec.path,
            ensure: EnsureState::Absent,
            content: None,
            owner: spec.owner,
            group: spec.group,
            mode: spec.mode,
        }
    }
}

/// The complete, ordered result of resolving one CA or certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactPlan {
    /// Kind of entry that was resolved.
    pub kind: EntryKind,
    /// Identifier that was resolved.
    pub identifier: String,
    artifacts: Vec<PlannedArtifact>,
}

impl ArtifactPlan {
    /// An empty plan for `identifier`.
    pub fn new(kind: EntryKind, identifier: impl Into<String>) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
            artifacts: Vec::new(),
        }
    }

    /// Append an artifact, enforcing path uniqueness.
    pub fn push(&mut self, artifact: PlannedArtifact) -> Result<(), ResolveError> {
        if self.target(&artifact.path).is_some() {
            return Err(ResolveError::DuplicatePath {
                identifier: self.identifier.clone(),
                path: artifact.path,
            });
        }
        self.artifacts.push(artifact);
        Ok(())
    }

    /// The planned artifacts, in materialization order.
    pub fn artifacts(&self) -> &[PlannedArtifact] {
        &self.artifacts
    }

    /// The artifact targeting `path`, if any.
    pub fn target(&self, path: &Path) -> Option<&PlannedArtifact> {
        self.artifacts.iter().find(|a| a.path == path)
    }

    /// Number of artifacts.
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether the plan holds no artifacts.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Consumes self and returns the artifacts.
    pub fn into_artifacts(self) -> Vec<PlannedArtifact> {
        self.artifacts
    }
}
