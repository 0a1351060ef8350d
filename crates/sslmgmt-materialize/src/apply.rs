//! Applying a whole plan.

use std::path::PathBuf;

use sslmgmt_core::{ArtifactPlan, EntryKind};

use crate::error::ApplyError;
use crate::{Change, FileMaterializer};

/// The outcome for one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedChange {
    /// Plan path of the artifact, before any re-rooting.
    pub path: PathBuf,
    pub change: Change,
}

/// Per-path outcome of applying one plan, in plan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub kind: EntryKind,
    /// Name of the CA or certificate the plan was resolved for.
    pub identifier: String,
    /// One entry per artifact, in plan order.
    pub changes: Vec<AppliedChange>,
}

impl ApplyReport {
    /// Number of artifacts that modified the filesystem.
    pub fn changed(&self) -> usize {
        self.changes.iter().filter(|c| c.change.is_change()).count()
    }

    /// Whether the host already matched the plan.
    pub fn is_converged(&self) -> bool {
        self.changed() == 0
    }
}

/// Ensure every artifact of `plan` in order, stopping at the first failure.
pub fn apply_plan<M: FileMaterializer + ?Sized>(
    plan: &ArtifactPlan,
    materializer: &M,
) -> Result<ApplyReport, ApplyError> {
    let mut changes = Vec::with_capacity(plan.len());

    for artifact in plan.artifacts() {
        match materializer.ensure(artifact) {
            Ok(change) => changes.push(AppliedChange {
                path: artifact.path.clone(),
                change,
            }),
            Err(source) => {
                tracing::warn!(
                    kind = %plan.kind,
                    identifier = %plan.identifier,
                    path = %artifact.path.display(),
                    "materialization failed: {source}"
                );
                return Err(ApplyError {
                    kind: plan.kind,
                    identifier: plan.identifier.clone(),
                    completed: changes,
                    source,
                });
            }
        }
    }

    let report = ApplyReport {
        kind: plan.kind,
        identifier: plan.identifier.clone(),
        changes,
    };
    tracing::debug!(
        kind = %report.kind,
        identifier = %report.identifier,
        changed = report.changed(),
        "plan applied"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sslmgmt_core::{Blob, FileMode, FileSpec, PlannedArtifact};

    use crate::RecordingMaterializer;

    fn spec(path: &str) -> FileSpec {
        FileSpec {
            path: PathBuf::from(path),
            owner: "root".into(),
            group: "root".into(),
            mode: FileMode::CERT,
        }
    }

    fn two_file_plan() -> ArtifactPlan {
        let mut plan = ArtifactPlan::new(EntryKind::Cert, "site");
        plan.push(PlannedArtifact::present(spec("/c/site.pem"), Blob::from("c\n")))
            .unwrap();
        plan.push(PlannedArtifact::present(spec("/k/site.pem"), Blob::from("k\n")))
            .unwrap();
        plan
    }

    #[test]
    fn test_apply_then_converged() {
        let m = RecordingMaterializer::new();
        let first = apply_plan(&two_file_plan(), &m).unwrap();
        assert_eq!(first.changed(), 2);
        assert!(!first.is_converged());

        let second = apply_plan(&two_file_plan(), &m).unwrap();
        assert!(second.is_converged());
        assert!(second
            .changes
            .iter()
            .all(|c| c.change == Change::Unchanged));
    }

    #[test]
    fn test_stops_at_first_failure() {
        let m = RecordingMaterializer::new().fail_on("/c/site.pem");
        let err = apply_plan(&two_file_plan(), &m).unwrap_err();
        assert!(err.completed.is_empty());
        assert_eq!(err.identifier, "site");
        assert!(m.file(std::path::Path::new("/k/site.pem")).is_none());
    }

    #[test]
    fn test_partial_progress_reported() {
        let m = RecordingMaterializer::new().fail_on("/k/site.pem");
        let err = apply_plan(&two_file_plan(), &m).unwrap_err();
        assert_eq!(
            err.completed,
            vec![AppliedChange {
                path: PathBuf::from("/c/site.pem"),
                change: Change::Created,
            }]
        );
    }
}
