//! Plan rendering.
//!
//! Content is never printed. Present artifacts show a short SHA-256 prefix
//! instead, so plans of key files can be shared and logged.

use sslmgmt_core::ArtifactPlan;

const DIGEST_PREFIX: usize = 12;

/// Render a plan as an aligned text table.
pub fn render_plan(plan: &ArtifactPlan) -> String {
    let mut out = format!("{} '{}':\n", plan.kind, plan.identifier);
    for artifact in plan.artifacts() {
        let digest = match &artifact.content {
            Some(blob) => {
                let hex = blob.sha256_hex();
                format!("sha256:{}", &hex[..DIGEST_PREFIX.min(hex.len())])
            }
            None => "-".to_string(),
        };
        out.push_str(&format!(
            "  {:<7} {} {}:{} {} {}\n",
            artifact.ensure.as_str(),
            artifact.mode,
            artifact.owner,
            artifact.group,
            artifact.path.display(),
            digest,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use sslmgmt_core::{Blob, EntryKind, FileMode, FileSpec, PlannedArtifact};

    #[test]
    fn test_render_hides_content() {
        let mut plan = ArtifactPlan::new(EntryKind::Cert, "site");
        plan.push(PlannedArtifact::present(
            FileSpec {
                path: PathBuf::from("/etc/pki/tls/private/site.pem"),
                owner: "root".into(),
                group: "root".into(),
                mode: FileMode::KEY,
            },
            Blob::from("SECRET KEY\n"),
        ))
        .unwrap();

        let text = render_plan(&plan);
        assert!(text.starts_with("cert 'site':\n"));
        assert!(text.contains("present 0600 root:root /etc/pki/tls/private/site.pem sha256:"));
        assert!(!text.contains("SECRET"));
    }

    #[test]
    fn test_render_one_line_per_artifact() {
        let mut plan = ArtifactPlan::new(EntryKind::Cert, "site");
        for (path, mode) in [
            ("/etc/pki/tls/certs/site.pem", FileMode::CERT),
            ("/etc/pki/tls/private/site.pem", FileMode::KEY),
        ] {
            plan.push(PlannedArtifact::absent(FileSpec {
                path: PathBuf::from(path),
                owner: "root".into(),
                group: "root".into(),
                mode,
            }))
            .unwrap();
        }

        let text = render_plan(&plan);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "  absent  0644 root:root /etc/pki/tls/certs/site.pem -");
        assert!(text.ends_with("site.pem -\n"));
    }
}
