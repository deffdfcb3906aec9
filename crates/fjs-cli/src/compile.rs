//! # Compile Subcommand
//!
//! Compiles a schema file into a persisted validation artifact.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use fjs_compiler::{CompileOptions, SchemaCompiler};

/// Arguments for the compile subcommand.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Schema file (JSON or YAML).
    pub schema: PathBuf,

    /// Write the artifact to this file instead of standard output.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Replace an existing output file.
    #[arg(long)]
    pub overwrite: bool,
}

/// Execute the compile subcommand.
pub fn run_compile(args: &CompileArgs, options: &CompileOptions) -> Result<u8> {
    let schema = crate::read_schema(&args.schema, options)?;
    let compiler = SchemaCompiler::new(options.clone()).with_handlers(crate::default_handlers());

    match &args.output {
        Some(output) => {
            let entry_point = compiler
                .write_artifact(output, &schema, args.overwrite)
                .with_context(|| format!("failed to compile {}", args.schema.display()))?;
            report_written(output, &entry_point);
        }
        None => {
            let (source, _) = compiler
                .emit(&schema)
                .with_context(|| format!("failed to compile {}", args.schema.display()))?;
            print!("{source}");
        }
    }
    Ok(0)
}

fn report_written(output: &Path, entry_point: &str) {
    println!("  artifact:     {}", output.display());
    println!("  entry point:  {entry_point}");
}
