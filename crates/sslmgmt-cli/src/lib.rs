//! # sslmgmt-cli: The `sslmgmt` Command
//!
//! ## Subcommands
//!
//! - `sslmgmt resolve ca|cert NAME --param k=v`: print the plan for one
//!   entry without touching the host.
//! - `sslmgmt check MANIFEST`: resolve every resource of a manifest.
//! - `sslmgmt apply MANIFEST [--root DIR] [--noop]`: resolve, then write.
//!
//! ```bash
//! sslmgmt resolve cert test_certificate --param pkistore=default --param chain=testca
//! sslmgmt -v apply /etc/sslmgmt/host.yaml --noop
//! ```
//!
//! Exit codes: 0 on success, 1 when any resource fails to resolve or
//! materialize.

pub mod apply;
pub mod check;
pub mod config;
pub mod manifest;
pub mod output;
pub mod params;
pub mod resolve;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use sslmgmt_lookup::HieraLookup;
use sslmgmt_resolve::Resolver;

use crate::config::Settings;
use crate::manifest::ManifestResolution;

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub settings: Settings,
    /// Hierarchy facts after layering hostname, config and `--fact` values.
    pub facts: BTreeMap<String, String>,
}

/// Load the data hierarchy and bind it to the configured presets.
pub fn build_resolver(options: &GlobalOptions) -> Result<Resolver<HieraLookup>> {
    let lookup = HieraLookup::load(&options.settings.hierarchy, &options.facts).with_context(
        || {
            format!(
                "failed to load data hierarchy under {}",
                options.settings.hierarchy.datadir.display()
            )
        },
    )?;
    tracing::info!(
        files = lookup.loaded_files().len(),
        datadir = %options.settings.hierarchy.datadir.display(),
        "loaded data hierarchy"
    );
    Ok(Resolver::new(lookup, options.settings.stores.clone()))
}

/// Print every failure of a manifest resolution to stderr.
pub fn report_failures(outcome: &ManifestResolution) {
    for failure in &outcome.failures {
        eprintln!(
            "FAIL: {} '{}' [{}]: {}",
            failure.kind,
            failure.name,
            failure.error.category(),
            failure.error
        );
    }
}
