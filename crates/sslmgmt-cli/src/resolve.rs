//! # Resolve Subcommand
//!
//! Resolves a single CA or certificate and prints its plan. Nothing is
//! written to the host.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use sslmgmt_core::EntryKind;

use crate::output::render_plan;
use crate::params::parse_params;
use crate::{build_resolver, GlobalOptions};

/// Entry kind selector.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    Ca,
    Cert,
}

impl From<KindArg> for EntryKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Ca => EntryKind::Ca,
            KindArg::Cert => EntryKind::Cert,
        }
    }
}

/// Arguments for the `sslmgmt resolve` subcommand.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Kind of entry to resolve.
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Entry name in the configuration store.
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Resolution parameter; the value is parsed as YAML. Repeatable.
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Print the plan as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the resolve subcommand.
pub fn run_resolve(args: &ResolveArgs, options: &GlobalOptions) -> Result<u8> {
    let params = parse_params(&args.params)?;
    let resolver = build_resolver(options)?;

    let plan = match resolver.resolve(args.kind.into(), &args.name, &params) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!(
                "FAIL: {} '{}' [{}]: {}",
                EntryKind::from(args.kind),
                args.name,
                e.category(),
                e
            );
            return Ok(1);
        }
    };

    if args.json {
        let json = serde_json::to_string_pretty(&plan).context("failed to serialize plan")?;
        println!("{json}");
    } else {
        print!("{}", render_plan(&plan));
    }
    Ok(0)
}
