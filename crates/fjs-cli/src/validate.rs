//! # Validate Subcommand
//!
//! Validates documents against a schema (compiled on the fly) or a
//! persisted artifact. Each document is reported on its own line; the exit
//! code is 1 if any document fails.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use fjs_compiler::{CompileOptions, SchemaCompiler, ValidationArtifact};

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Schema file to compile and validate against.
    #[arg(long, required_unless_present = "artifact", conflicts_with = "artifact")]
    pub schema: Option<PathBuf>,

    /// Persisted artifact to validate against.
    #[arg(long)]
    pub artifact: Option<PathBuf>,

    /// Print each valid document with defaults applied.
    #[arg(long)]
    pub print: bool,

    /// Documents to validate (JSON or YAML).
    #[arg(required = true)]
    pub documents: Vec<PathBuf>,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs, options: &CompileOptions) -> Result<u8> {
    let artifact = load_artifact(args, options)?;
    tracing::info!(
        entry_point = artifact.entry_point(),
        digest = %artifact.digest(),
        "loaded validator"
    );

    let mut failures = 0usize;
    for path in &args.documents {
        if !validate_one(&artifact, path, args.print)? {
            failures += 1;
        }
    }

    println!(
        "Documents: {}/{} passed",
        args.documents.len() - failures,
        args.documents.len()
    );
    Ok(if failures == 0 { 0 } else { 1 })
}

fn load_artifact(args: &ValidateArgs, options: &CompileOptions) -> Result<ValidationArtifact> {
    if let Some(path) = &args.artifact {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read artifact: {}", path.display()))?;
        return ValidationArtifact::from_source(&text)
            .with_context(|| format!("invalid artifact: {}", path.display()));
    }
    let path = args
        .schema
        .as_deref()
        .context("either --schema or --artifact is required")?;
    let schema = crate::read_schema(path, options)?;
    SchemaCompiler::new(options.clone())
        .with_handlers(crate::default_handlers())
        .compile(&schema)
        .with_context(|| format!("failed to compile {}", path.display()))
}

/// Returns whether the document passed.
fn validate_one(artifact: &ValidationArtifact, path: &Path, print: bool) -> Result<bool> {
    let document = crate::read_document(path)?;
    match artifact.validate(document) {
        Ok(value) => {
            println!("  PASS  {}", path.display());
            if print {
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            Ok(true)
        }
        Err(e) => {
            let pointer = e.pointer();
            let at = if pointer.is_empty() { "/" } else { pointer.as_str() };
            println!("  FAIL  {}: {} [{} at {at}]", path.display(), e.message, e.rule);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn all_documents_pass() {
        let dir = tempfile::tempdir().unwrap();
        let args = ValidateArgs {
            schema: Some(write(dir.path(), "s.yaml", "type: object\nrequired: [id]\n")),
            artifact: None,
            print: true,
            documents: vec![
                write(dir.path(), "a.json", r#"{"id": 1}"#),
                write(dir.path(), "b.yaml", "id: two\n"),
            ],
        };
        assert_eq!(run_validate(&args, &CompileOptions::default()).unwrap(), 0);
    }

    #[test]
    fn any_failure_returns_1() {
        let dir = tempfile::tempdir().unwrap();
        let args = ValidateArgs {
            schema: Some(write(dir.path(), "s.json", r#"{"type": "array"}"#)),
            artifact: None,
            print: false,
            documents: vec![
                write(dir.path(), "ok.json", "[]"),
                write(dir.path(), "bad.json", "{}"),
            ],
        };
        assert_eq!(run_validate(&args, &CompileOptions::default()).unwrap(), 1);
    }

    #[test]
    fn validates_against_persisted_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifact_path = dir.path().join("s.fjs.json");
        SchemaCompiler::default()
            .write_artifact(&artifact_path, &serde_json::json!({"type": "string"}), false)
            .unwrap();
        let args = ValidateArgs {
            schema: None,
            artifact: Some(artifact_path),
            print: false,
            documents: vec![write(dir.path(), "doc.json", r#""text""#)],
        };
        assert_eq!(run_validate(&args, &CompileOptions::default()).unwrap(), 0);
    }

    #[test]
    fn tampered_artifact_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifact_path = dir.path().join("s.fjs.json");
        SchemaCompiler::default()
            .write_artifact(&artifact_path, &serde_json::json!({"type": "string"}), false)
            .unwrap();
        let text = std::fs::read_to_string(&artifact_path)
            .unwrap()
            .replace("\"string\"", "\"null\"");
        std::fs::write(&artifact_path, text).unwrap();

        let args = ValidateArgs {
            schema: None,
            artifact: Some(artifact_path),
            print: false,
            documents: vec![write(dir.path(), "doc.json", "null")],
        };
        let err = run_validate(&args, &CompileOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("digest mismatch"));
    }

    #[test]
    fn unreadable_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = ValidateArgs {
            schema: Some(write(dir.path(), "s.json", "true")),
            artifact: None,
            print: false,
            documents: vec![dir.path().join("missing.json")],
        };
        assert!(run_validate(&args, &CompileOptions::default()).is_err());
    }
}
