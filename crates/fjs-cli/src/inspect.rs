//! # Inspect Subcommand
//!
//! Loads a persisted artifact (checking its format tag and digest) and
//! prints what it contains.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use fjs_compiler::{CompileOptions, Draft, ValidationArtifact};
use serde::Serialize;

/// Arguments for the inspect subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Artifact file to inspect.
    pub artifact: PathBuf,

    /// Emit the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Summary of a verified artifact.
#[derive(Debug, Serialize)]
pub struct InspectReport {
    /// Artifact format tag.
    pub format: String,
    /// Recorded (and verified) digest.
    pub digest: String,
    /// Draft the schema was compiled under.
    pub draft: Draft,
    /// Entry routine.
    pub entry_point: String,
    /// Options recorded in the artifact.
    pub options: CompileOptions,
    /// Regex dialect of the pattern table.
    pub regex_dialect: String,
    /// Number of interned patterns.
    pub patterns: usize,
    /// `(routine, scope)` pairs, root first.
    pub routines: Vec<(String, String)>,
}

impl InspectReport {
    fn of(artifact: &ValidationArtifact) -> Self {
        let program = artifact.program();
        Self {
            format: program.format.clone(),
            digest: artifact.digest().to_string(),
            draft: program.draft,
            entry_point: program.entry_point.clone(),
            options: program.options.clone(),
            regex_dialect: program.compatibility.regex_dialect.clone(),
            patterns: program.patterns.len(),
            routines: program
                .routines
                .iter()
                .map(|r| (r.name.clone(), r.scope.clone()))
                .collect(),
        }
    }
}

/// Execute the inspect subcommand.
pub fn run_inspect(args: &InspectArgs) -> Result<u8> {
    let report = inspect(&args.artifact)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(0);
    }

    println!("  format:       {}", report.format);
    println!("  digest:       {}", report.digest);
    println!("  draft:        {}", report.draft);
    println!("  entry point:  {}", report.entry_point);
    println!(
        "  options:      use_default={} use_formats={}",
        report.options.use_default, report.options.use_formats
    );
    println!("  patterns:     {} ({})", report.patterns, report.regex_dialect);
    println!();
    println!("Routines ({}):", report.routines.len());
    for (name, scope) in &report.routines {
        println!("  {name:<40} {scope}");
    }
    Ok(0)
}

/// Load and verify the artifact at `path`.
pub fn inspect(path: &Path) -> Result<InspectReport> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read artifact: {}", path.display()))?;
    let artifact = ValidationArtifact::from_source(&text)
        .with_context(|| format!("invalid artifact: {}", path.display()))?;
    Ok(InspectReport::of(&artifact))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fjs_compiler::SchemaCompiler;
    use serde_json::json;

    #[test]
    fn report_lists_routines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.fjs.json");
        SchemaCompiler::default()
            .write_artifact(
                &path,
                &json!({
                    "definitions": {"leaf": {"type": "string", "pattern": "^x"}},
                    "properties": {"leaf": {"$ref": "#/definitions/leaf"}}
                }),
                false,
            )
            .unwrap();

        let report = inspect(&path).unwrap();
        assert_eq!(report.format, fjs_compiler::ARTIFACT_FORMAT);
        assert_eq!(report.draft, Draft::Draft7);
        assert_eq!(report.entry_point, "validate");
        assert_eq!(report.patterns, 1);
        let names: Vec<&str> = report.routines.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["validate", "validate_definitions_leaf"]);
        assert!(report.digest.starts_with("sha256:"));

        let args = InspectArgs {
            artifact: path,
            json: true,
        };
        assert_eq!(run_inspect(&args).unwrap(), 0);
    }

    #[test]
    fn non_artifact_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, r#"{"type": "string"}"#).unwrap();
        let err = inspect(&path).unwrap_err();
        assert!(format!("{err:#}").contains("invalid artifact"));
    }
}
