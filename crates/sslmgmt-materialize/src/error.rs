//! Materialization errors.
//!
//! Kept apart from [`sslmgmt_core::ResolveError`]: a plan that resolved
//! cleanly can still fail to land on disk, and callers report the two
//! differently.

use std::path::PathBuf;

use sslmgmt_core::EntryKind;
use thiserror::Error;

use crate::apply::AppliedChange;

/// Failure converging one planned artifact.
#[derive(Error, Debug)]
pub enum MaterializeError {
    /// A filesystem operation failed.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        /// Target path (after re-rooting).
        path: PathBuf,
        /// What was being attempted, e.g. `write` or `remove`.
        operation: &'static str,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The planned owner does not exist on this host.
    #[error("unknown owner '{owner}' for {path}")]
    UnknownOwner {
        /// Target path.
        path: PathBuf,
        /// User name from the plan.
        owner: String,
    },

    /// The planned group does not exist on this host.
    #[error("unknown group '{group}' for {path}")]
    UnknownGroup {
        /// Target path.
        path: PathBuf,
        /// Group name from the plan.
        group: String,
    },

    /// Resolving or applying ownership failed at the OS level.
    #[error("failed to set ownership of {path}: {source}")]
    Ownership {
        /// Target path.
        path: PathBuf,
        /// Errno reported by the OS.
        source: nix::errno::Errno,
    },

    /// A directory occupies the target path.
    #[error("{path} is a directory")]
    IsDirectory {
        /// Target path.
        path: PathBuf,
    },

    /// The parent directory of the target does not exist.
    #[error("parent directory of {path} does not exist")]
    MissingParent {
        /// Target path.
        path: PathBuf,
    },

    /// A present artifact arrived without content.
    #[error("present artifact {path} has no content")]
    MissingContent {
        /// Target path.
        path: PathBuf,
    },
}

impl MaterializeError {
    pub(crate) fn io(
        path: impl Into<PathBuf>,
        operation: &'static str,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            path: path.into(),
            operation,
            source,
        }
    }
}

/// A plan application that stopped at its first failing artifact.
#[derive(Error, Debug)]
#[error("{kind} '{identifier}': {source}")]
pub struct ApplyError {
    /// Kind of the plan being applied.
    pub kind: EntryKind,
    /// Identifier of the plan being applied.
    pub identifier: String,
    /// Artifacts converged before the failure, in plan order.
    pub completed: Vec<AppliedChange>,
    /// The failure itself.
    #[source]
    pub source: MaterializeError,
}
