//! # fjs CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fjs_cli::compile::{run_compile, CompileArgs};
use fjs_cli::inspect::{run_inspect, InspectArgs};
use fjs_cli::validate::{run_validate, ValidateArgs};

/// fjs: JSON Schema compiler
///
/// Compiles JSON Schema (drafts 4, 6 and 7) into portable validation
/// artifacts and validates documents against them.
#[derive(Parser, Debug)]
#[command(name = "fjs", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Compile options file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a schema into a validation artifact.
    Compile(CompileArgs),

    /// Validate documents against a schema or an artifact.
    Validate(ValidateArgs),

    /// Verify an artifact and summarize its contents.
    Inspect(InspectArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = fjs_cli::load_options(cli.config.as_deref()).and_then(|options| {
        tracing::debug!(?options, "compile options");
        match &cli.command {
            Commands::Compile(args) => run_compile(args, &options),
            Commands::Validate(args) => run_validate(args, &options),
            Commands::Inspect(args) => run_inspect(args),
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
