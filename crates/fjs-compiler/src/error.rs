//! # Compiler Error Taxonomy
//!
//! Two disjoint families:
//!
//! - **Compile time**: [`SchemaResolutionError`] (a reference cannot be
//!   followed) and [`SchemaCompilationError`] (a keyword is structurally
//!   invalid). [`CompileError`] wraps both. Compilation either returns a
//!   complete artifact or one of these; nothing is retried.
//! - **Run time**: [`DataValidationError`], the first violated constraint
//!   with the path from the root of the value to the violating position.
//!
//! Loading a persisted artifact can fail with [`ArtifactError`]; the
//! persistence collaborator adds [`PersistError`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fjs_core::PointerError;

/// A reference could not be resolved to a schema node.
#[derive(Error, Debug)]
pub enum SchemaResolutionError {
    /// No retrieval handler is registered for the URI scheme.
    #[error("cannot resolve \"{uri}\": no retrieval handler for scheme \"{scheme}\"")]
    UnknownScheme {
        /// The absolute URI being retrieved.
        uri: String,
        /// Its scheme.
        scheme: String,
    },

    /// The handler for the scheme returned an error.
    #[error("retrieval of \"{uri}\" failed: {reason}")]
    RetrievalFailed {
        /// The absolute URI being retrieved.
        uri: String,
        /// The handler's error message.
        reason: String,
    },

    /// A `$ref` or `$id` is not a valid URI reference.
    #[error("invalid URI \"{reference}\" relative to \"{base}\": {reason}")]
    InvalidUri {
        /// Base URI the reference was resolved against.
        base: String,
        /// The reference text.
        reference: String,
        /// Parser message.
        reason: String,
    },

    /// The fragment is not a valid JSON Pointer.
    #[error("invalid fragment in \"{uri}\": {source}")]
    InvalidFragment {
        /// The reference's absolute URI.
        uri: String,
        /// The pointer parse failure.
        #[source]
        source: PointerError,
    },

    /// The pointer does not address anything in the target document.
    #[error("\"{uri}\" does not exist: pointer \"{pointer}\" not found in document")]
    PointerNotFound {
        /// The reference's absolute URI.
        uri: String,
        /// The pointer that failed to resolve.
        pointer: String,
    },

    /// The addressed node is neither a boolean nor a mapping.
    #[error("\"{uri}\" does not point at a schema (found {found})")]
    InvalidTarget {
        /// The reference's absolute URI.
        uri: String,
        /// Kind of value found instead.
        found: String,
    },

    /// A `$ref` value is not a string.
    #[error("invalid $ref at {location}: expected a string, found {found}")]
    InvalidReference {
        /// Schema location of the bad `$ref`.
        location: String,
        /// Kind of value found instead.
        found: String,
    },
}

/// A schema uses a keyword in a way that is invalid for its draft.
#[derive(Error, Debug)]
pub enum SchemaCompilationError {
    /// A keyword's value has the wrong shape.
    #[error("invalid \"{keyword}\" at {location}: {reason}")]
    InvalidKeyword {
        /// Schema location (`<document>#<pointer>`).
        location: String,
        /// The offending keyword.
        keyword: String,
        /// What was expected.
        reason: String,
    },

    /// A `pattern` or `patternProperties` key is not a valid regular expression.
    #[error("invalid pattern \"{pattern}\" at {location}: {reason}")]
    InvalidPattern {
        /// Schema location.
        location: String,
        /// The pattern source.
        pattern: String,
        /// Regex engine message.
        reason: String,
    },

    /// `additionalItems` declared without an `items` keyword.
    #[error("\"additionalItems\" without \"items\" at {location}")]
    AdditionalItemsWithoutItems {
        /// Schema location.
        location: String,
    },

    /// A chain of references returns to a routine without consuming any
    /// part of the value, so validation could never terminate.
    ///
    /// Calls in `anyOf` branches after an always-accepting branch, and in
    /// the `if` branch a constant condition never takes, are not counted.
    /// Every other same-value call is, whether or not data could reach it.
    #[error("routine \"{routine}\" calls itself without descending into the value (via {chain})")]
    InfiniteRecursion {
        /// The routine on the cycle.
        routine: String,
        /// The cycle, rendered as `a -> b -> a`.
        chain: String,
    },
}

/// Linking IR into callable routines failed.
#[derive(Error, Debug)]
pub enum LinkError {
    /// A call names a routine that is not in the artifact.
    #[error("call to unknown routine \"{0}\"")]
    UnknownRoutine(String),

    /// Two routines share a name.
    #[error("routine \"{0}\" is defined more than once")]
    DuplicateRoutine(String),

    /// The entry point names a routine that is not in the artifact.
    #[error("entry point \"{0}\" is not a routine of this artifact")]
    UnknownEntryPoint(String),

    /// A check refers to a pattern index outside the pattern table.
    #[error("pattern index {0} is out of range")]
    UnknownPattern(usize),

    /// A pattern in the table does not compile.
    #[error("pattern \"{pattern}\" does not compile: {reason}")]
    InvalidPattern {
        /// The pattern source.
        pattern: String,
        /// Regex engine message.
        reason: String,
    },
}

/// Any failure of [`compile`](crate::compile).
#[derive(Error, Debug)]
pub enum CompileError {
    /// Reference resolution failed.
    #[error("schema resolution error: {0}")]
    Resolution(#[from] SchemaResolutionError),

    /// A keyword is structurally invalid.
    #[error("schema compilation error: {0}")]
    Compilation(#[from] SchemaCompilationError),

    /// The generated routines could not be linked.
    #[error("link error: {0}")]
    Link(#[from] LinkError),

    /// The artifact body could not be canonicalized for its digest.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] fjs_core::CanonicalizationError),

    /// The artifact could not be rendered as text.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Loading a persisted artifact failed.
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// The text is not a valid artifact document.
    #[error("artifact parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The artifact was produced by an incompatible format version.
    #[error("unsupported artifact format \"{found}\" (expected \"{expected}\")")]
    UnsupportedFormat {
        /// Format tag in the document.
        found: String,
        /// Format tag this build understands.
        expected: String,
    },

    /// The recorded digest does not match the body.
    #[error("artifact digest mismatch: recorded {recorded}, computed {computed}")]
    DigestMismatch {
        /// Digest stored in the document.
        recorded: String,
        /// Digest recomputed from the body.
        computed: String,
    },

    /// The body could not be canonicalized.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] fjs_core::CanonicalizationError),

    /// The routines could not be linked.
    #[error("link error: {0}")]
    Link(#[from] LinkError),
}

/// Writing an artifact to disk failed.
#[derive(Error, Debug)]
pub enum PersistError {
    /// The destination exists and overwriting was not requested.
    #[error("file {0} already exists")]
    AlreadyExists(String),

    /// The schema did not compile.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// I/O error writing the destination.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One step of an instance path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object property name.
    Key(String),
    /// Array position.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// The first constraint a value violated.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct DataValidationError {
    /// Keys and indices from the root of the value to the violating position.
    pub path: Vec<PathSegment>,
    /// Human-readable description, prefixed with the rendered path
    /// (`data.a[0] must be string`).
    pub message: String,
    /// The keyword whose check failed.
    pub rule: String,
}

impl DataValidationError {
    pub(crate) fn new(path: &[PathSegment], rule: &str, requirement: impl fmt::Display) -> Self {
        Self {
            path: path.to_vec(),
            message: format!("{} {requirement}", render_path(path)),
            rule: rule.to_string(),
        }
    }

    /// The path as a JSON Pointer (`/a/0`).
    pub fn pointer(&self) -> String {
        self.path
            .iter()
            .map(|segment| {
                format!("/{}", segment.to_string().replace('~', "~0").replace('/', "~1"))
            })
            .collect()
    }

    /// The path in `data.a[0]` form used inside messages.
    pub fn name(&self) -> String {
        render_path(&self.path)
    }
}

pub(crate) fn render_path(path: &[PathSegment]) -> String {
    let mut out = String::from("data");
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                out.push('.');
                out.push_str(key);
            }
            PathSegment::Index(index) => {
                out.push_str(&format!("[{index}]"));
            }
        }
    }
    out
}
