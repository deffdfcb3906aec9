//! Compilation options.
//!
//! Options are part of the artifact: they are recorded in its metadata and
//! covered by its digest, so a persisted artifact validates exactly like the
//! one returned by [`compile`](crate::compile).

use serde::{Deserialize, Serialize};

use crate::draft::Draft;

/// Tunables for [`SchemaCompiler`](crate::SchemaCompiler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    /// Dialect used when the root schema has no recognized `$schema`.
    pub default_draft: Draft,
    /// Inject `default` values for absent properties and tuple positions.
    pub use_default: bool,
    /// Check the `format` keyword.
    pub use_formats: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            default_draft: Draft::Draft7,
            use_default: true,
            use_formats: true,
        }
    }
}

impl CompileOptions {
    /// Parse options from YAML (or JSON, which is valid YAML).
    ///
    /// Missing fields take their default values; unknown fields are rejected.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_defaults_and_formats() {
        let opts = CompileOptions::default();
        assert_eq!(opts.default_draft, Draft::Draft7);
        assert!(opts.use_default);
        assert!(opts.use_formats);
    }

    #[test]
    fn yaml_partial_override() {
        let opts = CompileOptions::from_yaml("default_draft: draft4\nuse_formats: false\n").unwrap();
        assert_eq!(opts.default_draft, Draft::Draft4);
        assert!(opts.use_default);
        assert!(!opts.use_formats);
    }

    #[test]
    fn json_is_accepted() {
        let opts = CompileOptions::from_yaml(r#"{"use_default": false}"#).unwrap();
        assert!(!opts.use_default);
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(CompileOptions::from_yaml("detailed: true").is_err());
    }
}
