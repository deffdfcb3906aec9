//! # fjs-cli — Command-Line Front End
//!
//! Provides the `fjs` binary over [`fjs_compiler`].
//!
//! ## Subcommands
//!
//! - `fjs compile`: Compile a schema and write (or print) its artifact.
//! - `fjs validate`: Validate documents against a schema or a persisted artifact.
//! - `fjs inspect`: Verify an artifact and summarize its routines.
//!
//! ```bash
//! fjs compile person.schema.yaml -o person.fjs.json
//! fjs validate --artifact person.fjs.json alice.json bob.yaml
//! fjs -vv validate --schema person.schema.yaml alice.json
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; handlers take parsed args and
//!   return an exit code.
//! - Handlers delegate to `fjs-compiler` and only format its results.

pub mod compile;
pub mod inspect;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use fjs_compiler::retrieve::load_document;
use fjs_compiler::{CompileOptions, Draft, FileRetriever, Handlers};
use serde_json::Value;
use url::Url;

/// Load compile options from a YAML file, or the defaults when none is given.
pub fn load_options(config: Option<&Path>) -> Result<CompileOptions> {
    let Some(path) = config else {
        return Ok(CompileOptions::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    CompileOptions::from_yaml(&text)
        .with_context(|| format!("invalid config: {}", path.display()))
}

/// Handlers available from the command line: local files only.
pub fn default_handlers() -> Handlers {
    Handlers::new().with("file", FileRetriever::new())
}

/// Read a JSON or YAML document.
pub fn read_document(path: &Path) -> Result<Value> {
    load_document(path).map_err(|e| anyhow::anyhow!("{e}"))
}

/// Read a schema file and anchor it at its own location.
///
/// A root schema without an identifier gets its file URI as `$id` (or `id`
/// under draft 4), so relative `$ref`s resolve next to the file.
pub fn read_schema(path: &Path, options: &CompileOptions) -> Result<Value> {
    let mut schema = read_document(path)?;
    let draft = Draft::detect(&schema).unwrap_or(options.default_draft);
    if let Value::Object(map) = &mut schema {
        let id_keyword = draft.id_keyword();
        if !map.contains_key(id_keyword) {
            let absolute = std::fs::canonicalize(path)
                .with_context(|| format!("failed to resolve {}", path.display()))?;
            let uri = Url::from_file_path(&absolute)
                .map_err(|()| anyhow::anyhow!("{} is not a local path", absolute.display()))?;
            map.insert(id_keyword.to_string(), Value::String(uri.to_string()));
        }
    }
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_uses_defaults() {
        assert_eq!(load_options(None).unwrap(), CompileOptions::default());
    }

    #[test]
    fn config_file_overrides_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fjs.yaml");
        std::fs::write(&path, "use_formats: false\n").unwrap();
        let options = load_options(Some(&path)).unwrap();
        assert!(!options.use_formats);
        assert!(options.use_default);
    }

    #[test]
    fn bad_config_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fjs.yaml");
        std::fs::write(&path, "verbose: true\n").unwrap();
        let err = load_options(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("fjs.yaml"));
    }

    #[test]
    fn schema_gets_file_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        std::fs::write(&path, r#"{"type": "string"}"#).unwrap();
        let schema = read_schema(&path, &CompileOptions::default()).unwrap();
        let id = schema["$id"].as_str().unwrap();
        assert!(id.starts_with("file://"));
        assert!(id.ends_with("/s.json"));
    }

    #[test]
    fn draft4_schema_gets_plain_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.yaml");
        std::fs::write(
            &path,
            "$schema: 'http://json-schema.org/draft-04/schema#'\ntype: string\n",
        )
        .unwrap();
        let schema = read_schema(&path, &CompileOptions::default()).unwrap();
        assert!(schema.get("$id").is_none());
        assert!(schema["id"].as_str().unwrap().ends_with("/s.yaml"));
    }

    #[test]
    fn declared_id_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        std::fs::write(&path, r#"{"$id": "http://example.com/s.json"}"#).unwrap();
        let schema = read_schema(&path, &CompileOptions::default()).unwrap();
        assert_eq!(schema["$id"], "http://example.com/s.json");
    }
}
