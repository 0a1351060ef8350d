//! # sslmgmt CLI entry point
//!
//! Parses command-line arguments, installs logging, loads configuration
//! and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use sslmgmt_cli::apply::{run_apply, ApplyArgs};
use sslmgmt_cli::check::{run_check, CheckArgs};
use sslmgmt_cli::config::{Settings, CONFIG_ENV};
use sslmgmt_cli::resolve::{run_resolve, ResolveArgs};
use sslmgmt_cli::GlobalOptions;

/// Certificate and CA provisioning from a hierarchical YAML store.
///
/// Resolves CA and certificate entries into file plans (paths, ownership,
/// modes, content) and converges hosts onto them.
#[derive(Parser, Debug)]
#[command(name = "sslmgmt", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Additional hierarchy fact (key=value). Repeatable.
    #[arg(long = "fact", value_name = "KEY=VALUE", global = true)]
    facts: Vec<String>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve one CA or certificate and print its plan.
    Resolve(ResolveArgs),

    /// Resolve every resource of a manifest without writing.
    Check(CheckArgs),

    /// Resolve a manifest and write its files.
    Apply(ApplyArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG, when set, overrides the verbosity flags.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    match cli.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "sslmgmt starting");

    let result = load_options(&cli).and_then(|options| match &cli.command {
        Commands::Resolve(args) => run_resolve(args, &options),
        Commands::Check(args) => run_check(args, &options),
        Commands::Apply(args) => run_apply(args, &options),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn load_options(cli: &Cli) -> anyhow::Result<GlobalOptions> {
    let settings = Settings::load(cli.config.as_deref()).context("failed to load configuration")?;
    let facts = settings.facts(&cli.facts)?;
    tracing::debug!(
        config = ?settings.source,
        levels = settings.hierarchy.levels.len(),
        presets = settings.stores.names().len(),
        "configuration loaded"
    );
    Ok(GlobalOptions { settings, facts })
}
