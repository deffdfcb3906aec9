//! # Validation Artifact
//!
//! The compiled output: every routine, the pattern table, the entry point
//! and the metadata needed to run it again elsewhere (draft, options,
//! regex dialect).
//!
//! Two forms share one set of closures:
//!
//! - **In memory.** [`compile`](crate::compile) links the [`Program`]
//!   directly.
//! - **Persisted.** [`ValidationArtifact::to_source`] writes the program as
//!   pretty JSON together with the SHA-256 digest of its canonical (JCS)
//!   bytes. [`ValidationArtifact::from_source`] checks the format tag and the
//!   digest, then links the same program.
//!
//! ## Invariant
//!
//! `to_source` is a pure function of the program, so identical schemas and
//! options produce byte-identical text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use fjs_core::{sha256_digest, CanonicalBytes, ContentDigest};

use crate::draft::Draft;
use crate::error::{ArtifactError, CompileError, DataValidationError};
use crate::ir::Node;
use crate::options::CompileOptions;
use crate::runtime::Runtime;

/// Format tag of persisted artifacts.
pub const ARTIFACT_FORMAT: &str = "fjs-artifact/1";

/// The serializable body of an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Always [`ARTIFACT_FORMAT`] for programs this build produces.
    pub format: String,
    /// Dialect the schema was compiled under.
    pub draft: Draft,
    /// Name of the routine to call first.
    pub entry_point: String,
    /// Options the schema was compiled with.
    pub options: CompileOptions,
    /// How portable the program's regular expressions are.
    pub compatibility: Compatibility,
    /// Regular expression sources, addressed by index.
    pub patterns: Vec<String>,
    /// One routine per reachable scope, root first.
    pub routines: Vec<RoutineDef>,
}

/// Regular-expression dialect metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compatibility {
    /// Engine whose syntax the patterns were accepted by.
    pub regex_dialect: String,
    /// What that means for other engines.
    pub note: String,
}

impl Default for Compatibility {
    fn default() -> Self {
        Self {
            regex_dialect: "rust-regex".to_string(),
            note: "patterns use the Rust regex syntax and are matched unanchored; \
                   look-around and backreferences are rejected at compile time"
                .to_string(),
        }
    }
}

/// One compiled routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineDef {
    /// Routine name, unique within the program.
    pub name: String,
    /// The scope it was compiled from (`<uri>#<pointer>`).
    pub scope: String,
    /// The routine body.
    pub body: Node,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    digest: String,
    program: Program,
}

/// A compiled, linked schema. Immutable and safe to share across threads.
#[derive(Debug)]
pub struct ValidationArtifact {
    program: Program,
    digest: ContentDigest,
    runtime: Runtime,
}

impl ValidationArtifact {
    pub(crate) fn assemble(program: Program) -> Result<Self, CompileError> {
        let digest = digest_of(&program)?;
        let runtime = link(&program)?;
        Ok(Self {
            program,
            digest,
            runtime,
        })
    }

    /// Validate `value`, returning it with any defaults injected.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self, mut value: Value) -> Result<Value, DataValidationError> {
        self.runtime.run(&mut value)?;
        Ok(value)
    }

    /// Validate `value` in place. On failure the value may hold defaults
    /// injected before the failing check.
    pub fn validate_in_place(&self, value: &mut Value) -> Result<(), DataValidationError> {
        self.runtime.run(value)
    }

    /// Validate a copy of `value`.
    pub fn is_valid(&self, value: &Value) -> bool {
        self.runtime.run(&mut value.clone()).is_ok()
    }

    /// Name of the entry routine.
    pub fn entry_point(&self) -> &str {
        &self.program.entry_point
    }

    /// Routine names, root first.
    pub fn routine_names(&self) -> impl Iterator<Item = &str> {
        self.program.routines.iter().map(|r| r.name.as_str())
    }

    /// The draft the schema was compiled under.
    pub fn draft(&self) -> Draft {
        self.program.draft
    }

    /// The program this artifact runs.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// SHA-256 digest of the program's canonical bytes.
    pub fn digest(&self) -> &ContentDigest {
        &self.digest
    }

    /// Render the artifact as persisted text.
    pub fn to_source(&self) -> Result<String, serde_json::Error> {
        let envelope = Envelope {
            digest: self.digest.to_string(),
            program: self.program.clone(),
        };
        let mut text = serde_json::to_string_pretty(&envelope)?;
        text.push('\n');
        Ok(text)
    }

    /// Load an artifact rendered by [`to_source`](Self::to_source).
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] when the text does not parse, carries a
    /// different format tag, does not match its recorded digest, or does
    /// not link.
    pub fn from_source(text: &str) -> Result<Self, ArtifactError> {
        let envelope: Envelope = serde_json::from_str(text)?;
        let program = envelope.program;
        if program.format != ARTIFACT_FORMAT {
            return Err(ArtifactError::UnsupportedFormat {
                found: program.format,
                expected: ARTIFACT_FORMAT.to_string(),
            });
        }
        let digest = sha256_digest(&CanonicalBytes::new(&program)?);
        if digest.to_string() != envelope.digest {
            return Err(ArtifactError::DigestMismatch {
                recorded: envelope.digest,
                computed: digest.to_string(),
            });
        }
        let runtime = link(&program)?;
        Ok(Self {
            program,
            digest,
            runtime,
        })
    }
}

fn digest_of(program: &Program) -> Result<ContentDigest, CompileError> {
    Ok(sha256_digest(&CanonicalBytes::new(program)?))
}

fn link(program: &Program) -> Result<Runtime, crate::error::LinkError> {
    Runtime::link(
        program.draft,
        program
            .routines
            .iter()
            .map(|r| (r.name.as_str(), &r.body)),
        &program.patterns,
        &program.entry_point,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Check;
    use fjs_core::JsonKind;
    use serde_json::json;

    fn string_program() -> Program {
        Program {
            format: ARTIFACT_FORMAT.to_string(),
            draft: Draft::Draft7,
            entry_point: "validate".to_string(),
            options: CompileOptions::default(),
            compatibility: Compatibility::default(),
            patterns: Vec::new(),
            routines: vec![RoutineDef {
                name: "validate".to_string(),
                scope: "fjs:///root.json#".to_string(),
                body: Node::Checks {
                    checks: vec![Check::Type {
                        kinds: vec![JsonKind::String],
                    }],
                },
            }],
        }
    }

    #[test]
    fn source_roundtrip_preserves_behavior() {
        let artifact = ValidationArtifact::assemble(string_program()).unwrap();
        let text = artifact.to_source().unwrap();
        let loaded = ValidationArtifact::from_source(&text).unwrap();
        assert_eq!(loaded.program(), artifact.program());
        assert_eq!(loaded.digest(), artifact.digest());
        assert!(loaded.is_valid(&json!("hello")));
        assert_eq!(
            loaded.validate(json!(42)).unwrap_err().message,
            "data must be string"
        );
    }

    #[test]
    fn tampered_source_is_rejected() {
        let artifact = ValidationArtifact::assemble(string_program()).unwrap();
        let text = artifact.to_source().unwrap().replace("\"string\"", "\"number\"");
        let err = ValidationArtifact::from_source(&text).unwrap_err();
        assert!(matches!(err, ArtifactError::DigestMismatch { .. }));
    }

    #[test]
    fn foreign_format_is_rejected() {
        let mut program = string_program();
        program.format = "fjs-artifact/99".to_string();
        let digest = sha256_digest(&CanonicalBytes::new(&program).unwrap());
        let text = serde_json::to_string(&json!({
            "digest": digest.to_string(),
            "program": program,
        }))
        .unwrap();
        let err = ValidationArtifact::from_source(&text).unwrap_err();
        assert!(matches!(err, ArtifactError::UnsupportedFormat { ref found, .. } if found == "fjs-artifact/99"));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            ValidationArtifact::from_source("not json"),
            Err(ArtifactError::Parse(_))
        ));
    }

    #[test]
    fn artifacts_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ValidationArtifact>();
    }
}
