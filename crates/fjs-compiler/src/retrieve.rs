//! # Retrieval Handlers
//!
//! The scope resolver never performs I/O on its own. When a `$ref` points
//! outside the documents it already holds, it looks up a handler by the
//! target URI's scheme and calls it once per document. A handler error is a
//! terminal [`SchemaResolutionError::RetrievalFailed`](crate::SchemaResolutionError).
//!
//! Two handlers ship with the crate:
//!
//! - [`InMemoryRetriever`]: a URI → document map, for schema registries
//!   preloaded by the caller.
//! - [`FileRetriever`]: reads `file:` URIs from disk, parsing `.yaml`/`.yml`
//!   as YAML and everything else as JSON.
//!
//! Any `Fn(&Url) -> Result<Value, RetrieveError> + Send + Sync` closure is
//! also a handler.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use url::Url;

/// Error type returned by handlers.
pub type RetrieveError = Box<dyn std::error::Error + Send + Sync>;

/// Fetches the schema document identified by an absolute URI (no fragment).
pub trait Retrieve: Send + Sync {
    /// Return the parsed document at `uri`.
    fn retrieve(&self, uri: &Url) -> Result<Value, RetrieveError>;
}

impl<F> Retrieve for F
where
    F: Fn(&Url) -> Result<Value, RetrieveError> + Send + Sync,
{
    fn retrieve(&self, uri: &Url) -> Result<Value, RetrieveError> {
        self(uri)
    }
}

/// Handlers keyed by URI scheme.
#[derive(Clone, Default)]
pub struct Handlers {
    by_scheme: BTreeMap<String, Arc<dyn Retrieve>>,
}

impl Handlers {
    /// An empty handler set: only references into the root document resolve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, scheme: impl Into<String>, handler: impl Retrieve + 'static) -> Self {
        self.insert(scheme, handler);
        self
    }

    /// Register `handler` for `scheme`, replacing any previous one.
    ///
    /// Schemes are matched case-insensitively (`Url` lowercases them).
    pub fn insert(&mut self, scheme: impl Into<String>, handler: impl Retrieve + 'static) {
        self.by_scheme
            .insert(scheme.into().to_ascii_lowercase(), Arc::new(handler));
    }

    /// The handler for `scheme`, if one is registered.
    pub fn get(&self, scheme: &str) -> Option<&Arc<dyn Retrieve>> {
        self.by_scheme.get(scheme)
    }

    /// Registered schemes in sorted order.
    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.by_scheme.keys().map(String::as_str)
    }

    /// True when no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.by_scheme.is_empty()
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("schemes", &self.by_scheme.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Serves documents from a preloaded URI → document map.
///
/// Lookup tries the exact URI first, then the URI with any trailing `#`
/// removed, so both `http://x/s.json` and `http://x/s.json#` registrations
/// are found.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRetriever {
    documents: HashMap<String, Value>,
}

impl InMemoryRetriever {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, uri: impl Into<String>, document: Value) -> Self {
        self.insert(uri, document);
        self
    }

    /// Register `document` under `uri`.
    pub fn insert(&mut self, uri: impl Into<String>, document: Value) {
        let uri = uri.into();
        let key = uri.strip_suffix('#').unwrap_or(&uri).to_string();
        self.documents.insert(key, document);
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when no document is registered.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Retrieve for InMemoryRetriever {
    fn retrieve(&self, uri: &Url) -> Result<Value, RetrieveError> {
        let uri_str = uri.as_str();
        let key = uri_str.strip_suffix('#').unwrap_or(uri_str);
        self.documents
            .get(key)
            .cloned()
            .ok_or_else(|| format!("no document registered for {key}").into())
    }
}

/// Reads `file:` URIs from the local filesystem.
///
/// With a root directory set, paths outside it are refused.
#[derive(Debug, Clone, Default)]
pub struct FileRetriever {
    root: Option<PathBuf>,
}

impl FileRetriever {
    /// Read any local path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only read files under `root`.
    pub fn rooted(root: impl AsRef<Path>) -> Self {
        Self {
            root: Some(root.as_ref().to_path_buf()),
        }
    }
}

impl Retrieve for FileRetriever {
    fn retrieve(&self, uri: &Url) -> Result<Value, RetrieveError> {
        let path = uri
            .to_file_path()
            .map_err(|()| format!("{uri} is not a local file path"))?;
        if let Some(root) = &self.root {
            if !path.starts_with(root) {
                return Err(format!("{} is outside {}", path.display(), root.display()).into());
            }
        }
        load_document(&path)
    }
}

/// Load a JSON or YAML document, choosing the parser by file extension.
pub fn load_document(path: &Path) -> Result<Value, RetrieveError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "yaml" | "yml" => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
                .map_err(|e| format!("invalid YAML in {}: {e}", path.display()))?;
            Ok(yaml_to_json_value(&yaml)
                .map_err(|e| format!("YAML-to-JSON conversion failed for {}: {e}", path.display()))?)
        }
        _ => Ok(serde_json::from_str(&content)
            .map_err(|e| format!("invalid JSON in {}: {e}", path.display()))?),
    }
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Schemas and instances use only the JSON-compatible subset of YAML. Tags
/// are dropped; non-string mapping keys are stringified.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> = seq.iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}
