//! # Scope Resolver
//!
//! Builds the [`ScopeGraph`]: every schema node reachable from the root
//! through `$ref`, each with a unique routine name, plus the answer to
//! "which routine does reference `r` under base `b` call" for the compiler.
//!
//! ## Algorithm
//!
//! 1. Register the root document. Its base URI is its `$id` resolved against
//!    [`DEFAULT_BASE`]. Every embedded `$id` in the document is indexed.
//! 2. Process scopes in discovery order, starting with the root. For each,
//!    walk the node and every subschema the compiler inlines into its
//!    routine, tracking the base URI across `$id`s.
//! 3. Each `$ref` is joined with the current base. The document part is
//!    looked up in the id index, then fetched through the handler for its
//!    scheme. The fragment is a JSON Pointer or a plain-name identifier.
//! 4. The target scope is interned (named and queued on first sight) and
//!    recorded against `(base, reference text)`.
//!
//! A scope seen twice is not walked twice, so cyclic references terminate.
//! `definitions` entries are only reached through references.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use url::Url;

use fjs_core::{json_kind, JsonPointer};

use crate::draft::Draft;
use crate::error::SchemaResolutionError;
use crate::keywords::{inlined_subschemas, is_schema, Position};
use crate::retrieve::Handlers;
use crate::scope::{apply_id, base_at, declared_id, join, NameTable, Scope, DEFAULT_BASE};

/// One reachable schema node.
#[derive(Debug, Clone)]
pub struct ScopeEntry {
    /// The node's identity.
    pub scope: Scope,
    /// Base URI in effect inside the node.
    pub base: Url,
    /// Routine name.
    pub name: String,
}

#[derive(Debug)]
struct Document {
    root: Arc<Value>,
    base: Url,
}

/// All reachable scopes, in discovery order. Index 0 is the root.
#[derive(Debug)]
pub struct ScopeGraph {
    draft: Draft,
    entries: Vec<ScopeEntry>,
    index: HashMap<Scope, usize>,
    documents: HashMap<String, Document>,
    references: HashMap<(String, String), usize>,
}

impl ScopeGraph {
    /// The draft the graph was resolved under.
    pub fn draft(&self) -> Draft {
        self.draft
    }

    /// Scopes in discovery order.
    pub fn entries(&self) -> &[ScopeEntry] {
        &self.entries
    }

    /// Name of the root scope's routine.
    pub fn entry_point(&self) -> &str {
        self.entries.first().map_or("validate", |e| e.name.as_str())
    }

    /// Number of scopes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false once resolution succeeded; the root is a scope.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The schema node of `entry`.
    pub fn node(&self, entry: &ScopeEntry) -> Option<&Value> {
        let document = self.documents.get(entry.scope.uri.as_str())?;
        entry.scope.pointer.resolve(&document.root)
    }

    /// The scope a `$ref` with text `reference`, found under `base`, resolves to.
    pub fn reference(&self, base: &Url, reference: &str) -> Option<&ScopeEntry> {
        let key = (base.to_string(), reference.to_string());
        self.references.get(&key).map(|&i| &self.entries[i])
    }
}

/// Resolves every reference reachable from a root schema.
pub struct ScopeResolver<'h> {
    handlers: &'h Handlers,
    draft: Draft,
    graph: ScopeGraph,
    /// Absolute URI (with plain-name fragment, if any) → (document key, pointer).
    ids: HashMap<String, (String, JsonPointer)>,
    names: NameTable,
}

impl<'h> ScopeResolver<'h> {
    /// A resolver fetching external documents through `handlers`.
    pub fn new(handlers: &'h Handlers, draft: Draft) -> Self {
        Self {
            handlers,
            draft,
            graph: ScopeGraph {
                draft,
                entries: Vec::new(),
                index: HashMap::new(),
                documents: HashMap::new(),
                references: HashMap::new(),
            },
            ids: HashMap::new(),
            names: NameTable::default(),
        }
    }

    /// Resolve `root` and everything it references.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaResolutionError`] for a reference that cannot be
    /// followed: no handler for its scheme, a failing handler, a malformed
    /// URI, a pointer that addresses nothing, or a target that is not a schema.
    pub fn resolve(mut self, root: &Value) -> Result<ScopeGraph, SchemaResolutionError> {
        let default_base = join_default()?;
        if !is_schema(root) {
            return Err(SchemaResolutionError::InvalidTarget {
                uri: default_base.to_string(),
                found: json_kind(root).to_string(),
            });
        }
        let key = self.register_document(&default_base, root.clone())?;
        self.intern(&key, JsonPointer::root(), default_base.as_str())?;

        let mut next = 0;
        while next < self.graph.entries.len() {
            let entry = self.graph.entries[next].clone();
            let document = self
                .graph
                .documents
                .get(entry.scope.uri.as_str())
                .map(|d| Arc::clone(&d.root));
            if let Some(document) = document {
                if let Some(node) = entry.scope.pointer.resolve(&document) {
                    self.walk(node, &entry.base, &entry.scope.uri, &entry.scope.pointer)?;
                }
            }
            next += 1;
        }
        debug!(scopes = self.graph.entries.len(), "scope graph resolved");
        Ok(self.graph)
    }

    fn walk(
        &mut self,
        node: &Value,
        base: &Url,
        document: &Url,
        pointer: &JsonPointer,
    ) -> Result<(), SchemaResolutionError> {
        let Some(obj) = node.as_object() else {
            return Ok(());
        };
        if let Some(reference) = obj.get("$ref") {
            let Some(text) = reference.as_str() else {
                return Err(SchemaResolutionError::InvalidReference {
                    location: format!("{document}#{pointer}"),
                    found: json_kind(reference).to_string(),
                });
            };
            let target = self.resolve_reference(base, text)?;
            let target_name = &self.graph.entries[target].name;
            debug!(reference = text, %base, routine = %target_name, "resolved reference");
            self.graph
                .references
                .insert((base.to_string(), text.to_string()), target);
            return Ok(());
        }
        for (tokens, sub) in inlined_subschemas(obj, self.draft) {
            let child_base = apply_id(base, sub, self.draft)?;
            let child_pointer = tokens.into_iter().fold(pointer.clone(), |p, t| p.join(t));
            self.walk(sub, &child_base, document, &child_pointer)?;
        }
        Ok(())
    }

    fn resolve_reference(&mut self, base: &Url, reference: &str) -> Result<usize, SchemaResolutionError> {
        let target = join(base, reference)?;
        let mut document_uri = target.clone();
        document_uri.set_fragment(None);
        let (key, prefix) = match self.ids.get(document_uri.as_str()) {
            Some(hit) => hit.clone(),
            None => {
                let document = self.retrieve(&document_uri)?;
                let key = self.register_document(&document_uri, document)?;
                (key, JsonPointer::root())
            }
        };

        let fragment = target.fragment().unwrap_or("");
        if !fragment.is_empty() && !fragment.starts_with('/') {
            let (key, pointer) = self.ids.get(target.as_str()).cloned().ok_or_else(|| {
                SchemaResolutionError::PointerNotFound {
                    uri: target.to_string(),
                    pointer: format!("#{fragment}"),
                }
            })?;
            return self.intern(&key, pointer, target.as_str());
        }
        let pointer = JsonPointer::from_fragment(fragment).map_err(|source| {
            SchemaResolutionError::InvalidFragment {
                uri: target.to_string(),
                source,
            }
        })?;
        self.intern(&key, prefix.concat(&pointer), target.as_str())
    }

    fn retrieve(&self, uri: &Url) -> Result<Value, SchemaResolutionError> {
        let handler = self.handlers.get(uri.scheme()).ok_or_else(|| {
            SchemaResolutionError::UnknownScheme {
                uri: uri.to_string(),
                scheme: uri.scheme().to_string(),
            }
        })?;
        debug!(%uri, "retrieving schema document");
        handler
            .retrieve(uri)
            .map_err(|e| SchemaResolutionError::RetrievalFailed {
                uri: uri.to_string(),
                reason: e.to_string(),
            })
    }

    /// Store a document and index its embedded identifiers. Returns the
    /// document key (its base URI).
    fn register_document(&mut self, retrieved_as: &Url, root: Value) -> Result<String, SchemaResolutionError> {
        let base = apply_id(retrieved_as, &root, self.draft)?;
        let key = base.to_string();
        self.ids
            .entry(retrieved_as.to_string())
            .or_insert_with(|| (key.clone(), JsonPointer::root()));
        self.ids
            .entry(key.clone())
            .or_insert_with(|| (key.clone(), JsonPointer::root()));
        if let Some(id) = declared_id(&root, self.draft) {
            let named = join(retrieved_as, id)?;
            if named.fragment().is_some_and(|f| !f.is_empty()) {
                self.ids
                    .entry(named.to_string())
                    .or_insert_with(|| (key.clone(), JsonPointer::root()));
            }
        }
        self.index_ids(&key, &root, &JsonPointer::root(), &base, Position::Schema)?;
        self.graph.documents.insert(
            key.clone(),
            Document {
                root: Arc::new(root),
                base,
            },
        );
        Ok(key)
    }

    fn index_ids(
        &mut self,
        key: &str,
        node: &Value,
        pointer: &JsonPointer,
        base: &Url,
        position: Position,
    ) -> Result<(), SchemaResolutionError> {
        let children: Vec<(String, &Value)> = match node {
            Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            _ => return Ok(()),
        };
        for (token, child) in children {
            let child_position = position.child(node, &token);
            if child_position == Position::Opaque {
                continue;
            }
            let child_pointer = pointer.join(token);
            let mut child_base = base.clone();
            if child_position == Position::Schema {
                if let Some(id) = declared_id(child, self.draft) {
                    let named = join(base, id)?;
                    self.ids
                        .entry(named.to_string())
                        .or_insert_with(|| (key.to_string(), child_pointer.clone()));
                    if named.fragment().is_some_and(|f| !f.is_empty()) {
                        let mut without = named.clone();
                        without.set_fragment(None);
                        if !id.starts_with('#') {
                            self.ids
                                .entry(without.to_string())
                                .or_insert_with(|| (key.to_string(), child_pointer.clone()));
                            child_base = without;
                        }
                    } else {
                        child_base = named;
                    }
                }
            }
            self.index_ids(key, child, &child_pointer, &child_base, child_position)?;
        }
        Ok(())
    }

    /// Name and queue the node at `pointer` of document `key`, once.
    fn intern(&mut self, key: &str, pointer: JsonPointer, uri: &str) -> Result<usize, SchemaResolutionError> {
        let Some(document) = self.graph.documents.get(key) else {
            return Err(SchemaResolutionError::PointerNotFound {
                uri: uri.to_string(),
                pointer: pointer.to_string(),
            });
        };
        let node = pointer
            .resolve(&document.root)
            .ok_or_else(|| SchemaResolutionError::PointerNotFound {
                uri: uri.to_string(),
                pointer: pointer.to_string(),
            })?;
        if !is_schema(node) {
            return Err(SchemaResolutionError::InvalidTarget {
                uri: uri.to_string(),
                found: json_kind(node).to_string(),
            });
        }
        let scope = Scope {
            uri: document.base.clone(),
            pointer,
        };
        if let Some(&existing) = self.graph.index.get(&scope) {
            return Ok(existing);
        }
        let base = base_at(&document.base, &document.root, &scope.pointer, self.draft)?;
        let name = self.names.assign(&scope);
        debug!(%scope, routine = %name, "new scope");
        let index = self.graph.entries.len();
        self.graph.index.insert(scope.clone(), index);
        self.graph.entries.push(ScopeEntry { scope, base, name });
        Ok(index)
    }
}

fn join_default() -> Result<Url, SchemaResolutionError> {
    Url::parse(DEFAULT_BASE).map_err(|e| SchemaResolutionError::InvalidUri {
        base: String::new(),
        reference: DEFAULT_BASE.to_string(),
        reason: e.to_string(),
    })
}
