//! # Filesystem Materializer
//!
//! Writes planned artifacts to disk.
//!
//! ## Write Protocol
//!
//! 1. Resolve owner and group names to ids (when ownership is managed).
//!    Unknown names fail before anything is written.
//! 2. Compare the existing file's bytes, mode and ownership with the plan.
//!    A full match is [`Change::Unchanged`] and nothing is touched.
//! 3. Matching bytes with drifted attributes are fixed in place.
//!    A symlink at the target is always drift: it is replaced by a regular
//!    file and whatever it points to is left alone.
//! 4. Otherwise the content goes to a temporary file in the target
//!    directory, receives its mode and ownership there, and is renamed over
//!    the target. Readers never observe a partially written key.
//!
//! Parent directories are never created: a missing directory usually means
//! the wrong store was selected, and silently creating it would hide that.

use std::fs;
use std::io::{ErrorKind, Write};
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Component, Path, PathBuf};

use nix::unistd::{chown, geteuid, Gid, Group, Uid, User};
use sslmgmt_core::{Blob, EnsureState, FileMode, PlannedArtifact};
use tempfile::NamedTempFile;

use crate::error::MaterializeError;
use crate::{Change, FileMaterializer};

/// Materializer backed by the local filesystem.
#[derive(Debug, Clone)]
pub struct FsMaterializer {
    root: Option<PathBuf>,
    manage_ownership: bool,
    dry_run: bool,
}

impl Default for FsMaterializer {
    fn default() -> Self {
        Self::new()
    }
}

impl FsMaterializer {
    /// A materializer writing to the real paths of the plan.
    ///
    /// Ownership is managed only when running as root; an unprivileged
    /// process cannot chown to another user anyway.
    pub fn new() -> Self {
        Self {
            root: None,
            manage_ownership: geteuid().is_root(),
            dry_run: false,
        }
    }

    /// Re-root every plan path under `root`.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Force ownership management on or off.
    pub fn manage_ownership(mut self, manage: bool) -> Self {
        self.manage_ownership = manage;
        self
    }

    /// Report changes without performing them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The on-disk path a plan path maps to.
    pub fn target_path(&self, path: &Path) -> PathBuf {
        match &self.root {
            None => path.to_path_buf(),
            Some(root) => {
                let relative: PathBuf = path
                    .components()
                    .filter(|c| matches!(c, Component::Normal(_)))
                    .collect();
                root.join(relative)
            }
        }
    }

    fn ensure_present(
        &self,
        target: &Path,
        artifact: &PlannedArtifact,
    ) -> Result<Change, MaterializeError> {
        let content = artifact
            .content
            .as_ref()
            .ok_or_else(|| MaterializeError::MissingContent {
                path: target.to_path_buf(),
            })?;

        let ids = if self.manage_ownership {
            Some(resolve_ids(target, &artifact.owner, &artifact.group)?)
        } else {
            None
        };

        let change = match inspect(target)? {
            None => Change::Created,
            Some(meta) if meta.file_type().is_symlink() => {
                tracing::debug!(path = %target.display(), "replacing symlink");
                Change::Updated
            }
            Some(meta) => {
                let current =
                    fs::read(target).map_err(|e| MaterializeError::io(target, "read", e))?;
                if current == content.as_bytes() {
                    if attributes_match(&meta, artifact.mode, ids) {
                        tracing::debug!(path = %target.display(), "unchanged");
                        return Ok(Change::Unchanged);
                    }
                    if !self.dry_run {
                        set_attributes(target, artifact.mode, ids)?;
                    }
                    tracing::info!(
                        path = %target.display(),
                        mode = %artifact.mode,
                        owner = %artifact.owner,
                        group = %artifact.group,
                        dry_run = self.dry_run,
                        "updated attributes"
                    );
                    return Ok(Change::Updated);
                }
                Change::Updated
            }
        };

        if !self.dry_run {
            write_atomic(target, content, artifact.mode, ids)?;
        }
        tracing::info!(
            path = %target.display(),
            change = %change,
            bytes = content.len(),
            mode = %artifact.mode,
            dry_run = self.dry_run,
            "wrote file"
        );
        Ok(change)
    }

    fn ensure_absent(&self, target: &Path) -> Result<Change, MaterializeError> {
        if inspect(target)?.is_none() {
            tracing::debug!(path = %target.display(), "already absent");
            return Ok(Change::AlreadyAbsent);
        }
        if !self.dry_run {
            fs::remove_file(target).map_err(|e| MaterializeError::io(target, "remove", e))?;
        }
        tracing::info!(path = %target.display(), dry_run = self.dry_run, "removed file");
        Ok(Change::Removed)
    }
}

impl FileMaterializer for FsMaterializer {
    fn ensure(&self, artifact: &PlannedArtifact) -> Result<Change, MaterializeError> {
        let target = self.target_path(&artifact.path);
        match artifact.ensure {
            EnsureState::Present => self.ensure_present(&target, artifact),
            EnsureState::Absent => self.ensure_absent(&target),
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// Metadata of whatever sits at `target` without following symlinks,
/// `None` when nothing is there.
fn inspect(target: &Path) -> Result<Option<fs::Metadata>, MaterializeError> {
    match fs::symlink_metadata(target) {
        Ok(meta) if meta.is_dir() => Err(MaterializeError::IsDirectory {
            path: target.to_path_buf(),
        }),
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(MaterializeError::io(target, "stat", e)),
    }
}

fn resolve_ids(target: &Path, owner: &str, group: &str) -> Result<(Uid, Gid), MaterializeError> {
    let user = User::from_name(owner)
        .map_err(|source| MaterializeError::Ownership {
            path: target.to_path_buf(),
            source,
        })?
        .ok_or_else(|| MaterializeError::UnknownOwner {
            path: target.to_path_buf(),
            owner: owner.to_string(),
        })?;
    let group_entry = Group::from_name(group)
        .map_err(|source| MaterializeError::Ownership {
            path: target.to_path_buf(),
            source,
        })?
        .ok_or_else(|| MaterializeError::UnknownGroup {
            path: target.to_path_buf(),
            group: group.to_string(),
        })?;
    Ok((user.uid, group_entry.gid))
}

fn attributes_match(meta: &fs::Metadata, mode: FileMode, ids: Option<(Uid, Gid)>) -> bool {
    let mode_ok = meta.permissions().mode() & 0o7777 == mode.bits();
    let owner_ok = match ids {
        Some((uid, gid)) => meta.uid() == uid.as_raw() && meta.gid() == gid.as_raw(),
        None => true,
    };
    mode_ok && owner_ok
}

fn set_attributes(
    path: &Path,
    mode: FileMode,
    ids: Option<(Uid, Gid)>,
) -> Result<(), MaterializeError> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode.bits()))
        .map_err(|e| MaterializeError::io(path, "chmod", e))?;
    if let Some((uid, gid)) = ids {
        chown(path, Some(uid), Some(gid)).map_err(|source| MaterializeError::Ownership {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

fn write_atomic(
    target: &Path,
    content: &Blob,
    mode: FileMode,
    ids: Option<(Uid, Gid)>,
) -> Result<(), MaterializeError> {
    let parent = match target.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => Path::new("/"),
    };
    if !parent.is_dir() {
        return Err(MaterializeError::MissingParent {
            path: target.to_path_buf(),
        });
    }

    let mut tmp =
        NamedTempFile::new_in(parent).map_err(|e| MaterializeError::io(target, "create", e))?;
    tmp.write_all(content.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| MaterializeError::io(target, "write", e))?;
    set_attributes(tmp.path(), mode, ids)?;
    tmp.persist(target)
        .map_err(|e| MaterializeError::io(target, "rename", e.error))?;
    Ok(())
}
