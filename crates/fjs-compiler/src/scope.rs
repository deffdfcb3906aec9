//! # Scopes and Routine Names
//!
//! A [`Scope`] identifies one schema node: the absolute URI of the document
//! it lives in (never carrying a fragment) plus a decoded JSON Pointer into
//! that document. Scopes compare structurally, so `#/definitions/a`,
//! `#/definitions/%61` and a reference through an embedded `$id` that lands
//! on the same node are the same scope.
//!
//! ## Invariant
//!
//! Every scope in a compilation receives exactly one routine name, assigned
//! in discovery order by [`NameTable`]. The mapping depends only on the
//! scope strings and their order, so recompiling a schema reproduces it.

use std::collections::HashSet;
use std::fmt;

use serde_json::Value;
use url::Url;

use fjs_core::{sha256_hex, JsonPointer};

use crate::draft::Draft;
use crate::error::SchemaResolutionError;
use crate::keywords::Position;

/// Base URI given to a root schema that declares no `$id`.
///
/// It never appears in routine names.
pub const DEFAULT_BASE: &str = "fjs:///root.json";

/// A schema node's identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scope {
    /// Absolute document URI, without fragment.
    pub uri: Url,
    /// Location of the node within the document.
    pub pointer: JsonPointer,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.uri, self.pointer)
    }
}

/// Assigns collision-free routine names to scopes.
#[derive(Debug, Default)]
pub(crate) struct NameTable {
    taken: HashSet<String>,
}

impl NameTable {
    /// A taken name gets a scope hash suffix, lengthened (then counted)
    /// until the result is free.
    pub(crate) fn assign(&mut self, scope: &Scope) -> String {
        let base = sanitized_name(scope);
        let mut name = base.clone();
        if self.taken.contains(&name) {
            let hash = sha256_hex(scope.to_string().as_bytes());
            let mut candidates = (8..=hash.len())
                .step_by(8)
                .map(|len| format!("{base}_{}", &hash[..len]))
                .chain((1u64..).map(|n| format!("{base}_{hash}_{n}")));
            name = candidates
                .find(|candidate| !self.taken.contains(candidate))
                .unwrap_or(name);
        }
        self.taken.insert(name.clone());
        name
    }
}

/// `validate` followed by the scope with every run of non-word characters
/// collapsed to `_`.
fn sanitized_name(scope: &Scope) -> String {
    let uri = if scope.uri.as_str() == DEFAULT_BASE {
        ""
    } else {
        scope.uri.as_str()
    };
    let raw = format!("{uri}_{}", scope.pointer);
    let mut suffix = String::with_capacity(raw.len());
    for c in raw.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            suffix.push(c);
        } else if !suffix.ends_with('_') {
            suffix.push('_');
        }
    }
    let suffix = suffix.trim_matches('_');
    if suffix.is_empty() {
        "validate".to_string()
    } else {
        format!("validate_{suffix}")
    }
}

/// Resolve `reference` against `base`.
pub(crate) fn join(base: &Url, reference: &str) -> Result<Url, SchemaResolutionError> {
    base.join(reference)
        .map_err(|e| SchemaResolutionError::InvalidUri {
            base: base.to_string(),
            reference: reference.to_string(),
            reason: e.to_string(),
        })
}

/// The `$id` (or draft 4 `id`) a node declares.
///
/// A node carrying `$ref` declares nothing: its siblings are ignored.
pub(crate) fn declared_id(node: &Value, draft: Draft) -> Option<&str> {
    let obj = node.as_object()?;
    if obj.contains_key("$ref") {
        return None;
    }
    obj.get(draft.id_keyword()).and_then(Value::as_str)
}

/// Base URI in effect inside `node`, given the base of its parent.
///
/// Plain-name identifiers (`#foo`) name the node without moving the base.
pub(crate) fn apply_id(base: &Url, node: &Value, draft: Draft) -> Result<Url, SchemaResolutionError> {
    match declared_id(node, draft) {
        Some(id) if !id.starts_with('#') => {
            let mut uri = join(base, id)?;
            uri.set_fragment(None);
            Ok(uri)
        }
        _ => Ok(base.clone()),
    }
}

/// Base URI in effect at `pointer` inside a document whose root has base
/// `root_base`. Identifiers in non-schema positions (`enum`, `default`,
/// unknown keywords) are not applied.
pub(crate) fn base_at(
    root_base: &Url,
    document: &Value,
    pointer: &JsonPointer,
    draft: Draft,
) -> Result<Url, SchemaResolutionError> {
    let mut base = root_base.clone();
    let mut node = document;
    let mut position = Position::Schema;
    for token in pointer.tokens() {
        let next = match node {
            Value::Object(map) => map.get(token),
            Value::Array(items) => token.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        let Some(next) = next else {
            break;
        };
        position = position.child(node, token);
        node = next;
        if position == Position::Schema {
            base = apply_id(&base, node, draft)?;
        }
    }
    Ok(base)
}
