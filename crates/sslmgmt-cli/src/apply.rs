//! # Apply Subcommand
//!
//! Resolves a manifest and converges the host onto it.
//!
//! Nothing is written unless every resource resolved. Plans are applied in
//! manifest order and the run stops at the first artifact that fails to
//! materialize.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use sslmgmt_materialize::{apply_plan, FileMaterializer, FsMaterializer};

use crate::manifest::{resolve_manifest, Manifest, ManifestResolution};
use crate::{build_resolver, report_failures, GlobalOptions};

/// Arguments for the `sslmgmt apply` subcommand.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Host manifest listing CAs and certificates.
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Write under this directory instead of `/`.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Report what would change without writing.
    #[arg(long)]
    pub noop: bool,
}

/// Execute the apply subcommand.
pub fn run_apply(args: &ApplyArgs, options: &GlobalOptions) -> Result<u8> {
    let manifest = load_manifest(&args.manifest)?;
    let resolver = build_resolver(options)?;
    let outcome = resolve_manifest(&resolver, &manifest);

    let mut materializer = FsMaterializer::new().dry_run(args.noop);
    if let Some(root) = &args.root {
        materializer = materializer.with_root(root);
    }
    apply_outcome(&outcome, &materializer)
}

fn load_manifest(path: &Path) -> Result<Manifest> {
    Manifest::load(path).with_context(|| format!("failed to load {}", path.display()))
}

/// Apply a resolved manifest with `materializer`.
///
/// Returns 1 without writing anything when resolution was incomplete.
pub fn apply_outcome<M: FileMaterializer + ?Sized>(
    outcome: &ManifestResolution,
    materializer: &M,
) -> Result<u8> {
    if !outcome.is_complete() {
        report_failures(outcome);
        eprintln!(
            "{} resource(s) failed to resolve; nothing was applied.",
            outcome.failures.len()
        );
        return Ok(1);
    }

    let mut changed = 0usize;
    for plan in &outcome.plans {
        let report = apply_plan(plan, materializer)?;
        for applied in &report.changes {
            if applied.change.is_change() {
                println!("{}: {}", applied.change, applied.path.display());
            }
        }
        changed += report.changed();
    }

    println!(
        "Applied {} resource(s): {} file(s) changed",
        outcome.plans.len(),
        changed
    );
    Ok(0)
}
