//! # fjs-compiler — JSON Schema to Validation Artifact
//!
//! Compiles a JSON Schema (drafts 4, 6 and 7) into a [`ValidationArtifact`]:
//! one routine per reachable schema scope, linked into closures and invoked
//! through a single entry point. Validation rewrites the value in place to
//! inject declared `default`s and reports the first violation with its path.
//!
//! ## Pipeline
//!
//! 1. **Scope resolution** ([`resolver`]) follows every `$ref`, within the
//!    root and across documents fetched through [`Handlers`], and names each
//!    reachable scope exactly once.
//! 2. **Emission** (`emit`) translates each scope's keywords into routine IR
//!    ([`ir`]); subschemas are inlined and references become calls.
//! 3. **Assembly** ([`compiler`]) rejects routines that recurse on the same
//!    value and links the program ([`artifact`]).
//!
//! ```
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {"a": {"type": "number", "default": 42}}
//! });
//! let artifact = fjs_compiler::compile(&schema, fjs_compiler::Handlers::new()).unwrap();
//! assert_eq!(artifact.validate(json!({})).unwrap(), json!({"a": 42}));
//! ```
//!
//! ## Crate Policy
//!
//! - Depends only on `fjs-core` internally.
//! - No I/O during compilation except through retrieval handlers.
//! - Artifacts are immutable; every invocation owns its value and path.

pub mod artifact;
pub mod compiler;
pub mod draft;
mod emit;
pub mod error;
pub mod format;
pub mod ir;
mod keywords;
pub mod options;
mod persist;
pub mod resolver;
pub mod retrieve;
mod runtime;
pub mod scope;

use std::path::Path;

use serde_json::Value;

pub use artifact::{Program, RoutineDef, ValidationArtifact, ARTIFACT_FORMAT};
pub use compiler::SchemaCompiler;
pub use draft::Draft;
pub use error::{
    ArtifactError, CompileError, DataValidationError, LinkError, PathSegment, PersistError,
    SchemaCompilationError, SchemaResolutionError,
};
pub use options::CompileOptions;
pub use resolver::{ScopeGraph, ScopeResolver};
pub use retrieve::{FileRetriever, Handlers, InMemoryRetriever, Retrieve, RetrieveError};
pub use scope::Scope;

/// Compile `schema` with default options.
///
/// External documents are fetched through `handlers`, keyed by URI scheme.
pub fn compile(schema: &Value, handlers: Handlers) -> Result<ValidationArtifact, CompileError> {
    SchemaCompiler::default()
        .with_handlers(handlers)
        .compile(schema)
}

/// Compile `schema` and render the persisted artifact.
///
/// Returns `(source, entry point)`.
pub fn emit(schema: &Value, handlers: Handlers) -> Result<(String, String), CompileError> {
    SchemaCompiler::default().with_handlers(handlers).emit(schema)
}

/// Compile `schema` and write the artifact to `path`, refusing to replace an
/// existing file unless `overwrite` is set. Returns the entry point name.
pub fn write_artifact(
    path: impl AsRef<Path>,
    schema: &Value,
    handlers: Handlers,
    overwrite: bool,
) -> Result<String, PersistError> {
    SchemaCompiler::default()
        .with_handlers(handlers)
        .write_artifact(path, schema, overwrite)
}
