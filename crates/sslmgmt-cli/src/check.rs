//! # Check Subcommand
//!
//! Resolves every resource of a manifest and reports the outcome. Exit
//! code 1 when any resource fails.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::manifest::{resolve_manifest, Manifest};
use crate::{build_resolver, report_failures, GlobalOptions};

/// Arguments for the `sslmgmt check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Host manifest listing CAs and certificates.
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs, options: &GlobalOptions) -> Result<u8> {
    let manifest = Manifest::load(&args.manifest)
        .with_context(|| format!("failed to load {}", args.manifest.display()))?;
    let resolver = build_resolver(options)?;
    let outcome = resolve_manifest(&resolver, &manifest);

    for plan in &outcome.plans {
        println!(
            "OK: {} '{}' ({} artifact{})",
            plan.kind,
            plan.identifier,
            plan.len(),
            if plan.len() == 1 { "" } else { "s" }
        );
    }
    report_failures(&outcome);

    println!(
        "Resources: {}/{} resolved",
        outcome.plans.len(),
        manifest.resources.len()
    );
    Ok(if outcome.is_complete() { 0 } else { 1 })
}
