//! In-memory materializer.
//!
//! Keeps a file table instead of touching disk and records every artifact
//! it is asked to ensure. Change reporting follows [`FsMaterializer`]
//! exactly, so idempotence can be tested without a temporary directory.
//!
//! [`FsMaterializer`]: crate::FsMaterializer

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use sslmgmt_core::{Blob, EnsureState, FileMode, PlannedArtifact};

use crate::error::MaterializeError;
use crate::{Change, FileMaterializer};

/// One file in the in-memory table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFile {
    pub content: Blob,
    /// Owner and group are stored by name; nothing is resolved to ids.
    pub owner: String,
    pub group: String,
    pub mode: FileMode,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<PathBuf, RecordedFile>,
    log: Vec<(PathBuf, Change)>,
    failing: BTreeSet<PathBuf>,
}

/// Materializer backed by an in-memory file table.
#[derive(Debug, Default)]
pub struct RecordingMaterializer {
    state: Mutex<State>,
}

impl RecordingMaterializer {
    /// An empty file table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the table with an existing file.
    pub fn with_file(self, path: impl Into<PathBuf>, file: RecordedFile) -> Self {
        self.lock().files.insert(path.into(), file);
        self
    }

    /// Make every ensure of `path` fail with a permission error.
    pub fn fail_on(self, path: impl Into<PathBuf>) -> Self {
        self.lock().failing.insert(path.into());
        self
    }

    /// The file currently recorded at `path`.
    pub fn file(&self, path: &Path) -> Option<RecordedFile> {
        self.lock().files.get(path).cloned()
    }

    /// Every successful ensure so far, in call order.
    pub fn log(&self) -> Vec<(PathBuf, Change)> {
        self.lock().log.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FileMaterializer for RecordingMaterializer {
    fn ensure(&self, artifact: &PlannedArtifact) -> Result<Change, MaterializeError> {
        let mut state = self.lock();
        let path = artifact.path.clone();

        if state.failing.contains(&path) {
            return Err(MaterializeError::io(
                path,
                "write",
                io::Error::from(io::ErrorKind::PermissionDenied),
            ));
        }

        let change = match artifact.ensure {
            EnsureState::Absent => match state.files.remove(&path) {
                Some(_) => Change::Removed,
                None => Change::AlreadyAbsent,
            },
            EnsureState::Present => {
                let content = artifact
                    .content
                    .clone()
                    .ok_or_else(|| MaterializeError::MissingContent { path: path.clone() })?;
                let wanted = RecordedFile {
                    content,
                    owner: artifact.owner.clone(),
                    group: artifact.group.clone(),
                    mode: artifact.mode,
                };
                match state.files.insert(path.clone(), wanted.clone()) {
                    None => Change::Created,
                    Some(previous) if previous == wanted => Change::Unchanged,
                    Some(_) => Change::Updated,
                }
            }
        };

        state.log.push((path, change));
        Ok(change)
    }
}
