//! # Keyword Emitters
//!
//! Translates one schema node into a [`Node`]. Each keyword family lives in
//! its own module and returns at most one [`Check`]; this module owns the
//! shared [`EmitContext`] and the evaluation order:
//!
//! 1. `type`,
//! 2. every other keyword in document order,
//! 3. the combinators (`allOf`, `anyOf`, `oneOf`, `not`, `if`) in document order.
//!
//! A node with `$ref` compiles to a call and nothing else. Subschemas are
//! inlined; only references produce calls, so each routine is one pass
//! over its value.

mod array;
mod combinators;
mod numeric;
mod object;
mod string;
mod types;

use std::collections::HashMap;

use regex::Regex;
use serde_json::{Map, Number, Value};
use url::Url;

use fjs_core::{json_kind, JsonPointer};

use crate::draft::Draft;
use crate::error::{CompileError, SchemaCompilationError};
use crate::ir::{Check, Node};
use crate::keywords::{is_schema, COMBINATORS};
use crate::options::CompileOptions;
use crate::resolver::{ScopeEntry, ScopeGraph};
use crate::scope::apply_id;

/// Regular expressions used by the program, deduplicated by source.
#[derive(Debug, Default)]
pub(crate) struct PatternTable {
    sources: Vec<String>,
    index: HashMap<String, usize>,
}

impl PatternTable {
    /// Index of `pattern`, compiling it on first use to reject bad syntax.
    pub(crate) fn intern(&mut self, pattern: &str) -> Result<usize, regex::Error> {
        if let Some(&index) = self.index.get(pattern) {
            return Ok(index);
        }
        Regex::new(pattern)?;
        let index = self.sources.len();
        self.sources.push(pattern.to_string());
        self.index.insert(pattern.to_string(), index);
        Ok(index)
    }

    pub(crate) fn into_sources(self) -> Vec<String> {
        self.sources
    }
}

/// State shared by the emitters while compiling one scope graph.
pub(crate) struct EmitContext<'g> {
    graph: &'g ScopeGraph,
    pub(crate) draft: Draft,
    pub(crate) options: &'g CompileOptions,
    pub(crate) patterns: PatternTable,
    document: Url,
    base: Url,
    pointer: JsonPointer,
}

impl<'g> EmitContext<'g> {
    pub(crate) fn new(graph: &'g ScopeGraph, options: &'g CompileOptions) -> Self {
        let root = &graph.entries()[0];
        Self {
            graph,
            draft: graph.draft(),
            options,
            patterns: PatternTable::default(),
            document: root.scope.uri.clone(),
            base: root.base.clone(),
            pointer: root.scope.pointer.clone(),
        }
    }

    /// Compile the routine body of `entry`.
    pub(crate) fn routine(&mut self, entry: &ScopeEntry, node: &Value) -> Result<Node, CompileError> {
        self.document = entry.scope.uri.clone();
        self.base = entry.base.clone();
        self.pointer = entry.scope.pointer.clone();
        emit_node(self, node)
    }

    /// `<document>#<pointer>` of the node being compiled.
    pub(crate) fn location(&self) -> String {
        format!("{}#{}", self.document, self.pointer)
    }

    pub(crate) fn invalid(&self, keyword: &str, reason: impl Into<String>) -> CompileError {
        SchemaCompilationError::InvalidKeyword {
            location: self.location(),
            keyword: keyword.to_string(),
            reason: reason.into(),
        }
        .into()
    }

    /// Compile the subschema at `tokens` below the current node.
    pub(crate) fn subschema(
        &mut self,
        keyword: &str,
        value: &Value,
        tokens: &[&str],
    ) -> Result<Node, CompileError> {
        if !is_schema(value) {
            return Err(self.invalid(
                keyword,
                format!("expected a schema (boolean or object), found {}", json_kind(value)),
            ));
        }
        let base = apply_id(&self.base, value, self.draft)?;
        let pointer = tokens
            .iter()
            .fold(self.pointer.clone(), |pointer, token| pointer.join(*token));
        let saved_base = std::mem::replace(&mut self.base, base);
        let saved_pointer = std::mem::replace(&mut self.pointer, pointer);
        let node = emit_node(self, value);
        self.base = saved_base;
        self.pointer = saved_pointer;
        node
    }

    fn call(&self, reference: &Value) -> Result<Node, CompileError> {
        let text = reference
            .as_str()
            .ok_or_else(|| self.invalid("$ref", "expected a string"))?;
        self.graph
            .reference(&self.base, text)
            .map(|entry| Node::Call {
                routine: entry.name.clone(),
            })
            .ok_or_else(|| self.invalid("$ref", format!("\"{text}\" was not resolved")))
    }

    /// A non-negative integer (`2.0` is accepted).
    pub(crate) fn count(&self, keyword: &str, value: &Value) -> Result<u64, CompileError> {
        if let Some(n) = value.as_u64() {
            return Ok(n);
        }
        match value.as_f64() {
            Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
            _ => Err(self.invalid(keyword, "expected a non-negative integer")),
        }
    }

    pub(crate) fn number(&self, keyword: &str, value: &Value) -> Result<Number, CompileError> {
        match value {
            Value::Number(n) => Ok(n.clone()),
            other => Err(self.invalid(keyword, format!("expected a number, found {}", json_kind(other)))),
        }
    }

    pub(crate) fn string_list(&self, keyword: &str, value: &Value) -> Result<Vec<String>, CompileError> {
        let items = value
            .as_array()
            .ok_or_else(|| self.invalid(keyword, "expected an array of strings"))?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.invalid(keyword, "expected an array of strings"))
            })
            .collect()
    }

    pub(crate) fn object<'v>(
        &self,
        keyword: &str,
        value: &'v Value,
    ) -> Result<&'v Map<String, Value>, CompileError> {
        value
            .as_object()
            .ok_or_else(|| self.invalid(keyword, format!("expected an object, found {}", json_kind(value))))
    }

    pub(crate) fn pattern(&mut self, pattern: &str) -> Result<usize, CompileError> {
        self.patterns.intern(pattern).map_err(|e| {
            SchemaCompilationError::InvalidPattern {
                location: self.location(),
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// The `default` to inject for an absent position described by `schema`.
    pub(crate) fn default_of(&self, schema: &Value) -> Option<Value> {
        if !self.options.use_default {
            return None;
        }
        let obj = schema.as_object()?;
        if obj.contains_key("$ref") {
            return None;
        }
        obj.get("default").cloned()
    }
}

/// Compile one schema node.
pub(crate) fn emit_node(ctx: &mut EmitContext<'_>, schema: &Value) -> Result<Node, CompileError> {
    let map = match schema {
        Value::Bool(true) => return Ok(Node::Accept),
        Value::Bool(false) => return Ok(Node::Reject),
        Value::Object(map) => map,
        other => {
            return Err(ctx.invalid(
                "",
                format!("expected a schema (boolean or object), found {}", json_kind(other)),
            ))
        }
    };
    if let Some(reference) = map.get("$ref") {
        return ctx.call(reference);
    }

    let mut checks = Vec::new();
    if let Some(value) = map.get("type") {
        checks.push(types::emit_type(ctx, value)?);
    }
    let mut deferred = Vec::new();
    for (keyword, value) in map {
        let keyword = keyword.as_str();
        if !ctx.draft.supports(keyword) {
            continue;
        }
        if COMBINATORS.contains(&keyword) {
            deferred.extend(combinators::emit(ctx, map, keyword, value)?);
        } else {
            checks.extend(emit_keyword(ctx, map, keyword, value)?);
        }
    }
    checks.extend(deferred);

    if checks.is_empty() {
        Ok(Node::Accept)
    } else {
        Ok(Node::Checks { checks })
    }
}

fn emit_keyword(
    ctx: &mut EmitContext<'_>,
    schema: &Map<String, Value>,
    keyword: &str,
    value: &Value,
) -> Result<Option<Check>, CompileError> {
    match keyword {
        "enum" => types::emit_enum(ctx, value).map(Some),
        "const" => Ok(Some(types::emit_const(value))),
        "minimum" | "maximum" | "exclusiveMinimum" | "exclusiveMaximum" | "multipleOf" => {
            numeric::emit(ctx, schema, keyword, value)
        }
        "minLength" | "maxLength" | "pattern" | "format" => string::emit(ctx, keyword, value),
        "items" | "additionalItems" | "minItems" | "maxItems" | "uniqueItems" | "contains" => {
            array::emit(ctx, schema, keyword, value)
        }
        "required" | "properties" | "patternProperties" | "additionalProperties"
        | "minProperties" | "maxProperties" | "propertyNames" | "dependencies" => {
            object::emit(ctx, schema, keyword, value)
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::Value;

    use crate::draft::Draft;
    use crate::error::CompileError;
    use crate::ir::Node;
    use crate::options::CompileOptions;
    use crate::resolver::ScopeResolver;
    use crate::retrieve::Handlers;

    use super::EmitContext;

    /// Compile the root routine of `schema` and return it with the pattern table.
    pub(crate) fn emit_root(schema: &Value, draft: Draft) -> Result<(Node, Vec<String>), CompileError> {
        let options = CompileOptions {
            default_draft: draft,
            ..CompileOptions::default()
        };
        let graph = ScopeResolver::new(&Handlers::new(), draft).resolve(schema)?;
        let mut ctx = EmitContext::new(&graph, &options);
        let entry = graph.entries()[0].clone();
        let node = ctx.routine(&entry, schema)?;
        Ok((node, ctx.patterns.into_sources()))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::emit_root;
    use super::*;
    use serde_json::json;

    fn rules(node: &Node) -> Vec<&'static str> {
        match node {
            Node::Checks { checks } => checks.iter().map(Check::rule).collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn booleans_and_empty_objects() {
        assert_eq!(emit_root(&json!(true), Draft::Draft7).unwrap().0, Node::Accept);
        assert_eq!(emit_root(&json!(false), Draft::Draft7).unwrap().0, Node::Reject);
        assert_eq!(
            emit_root(&json!({"title": "x", "description": "y"}), Draft::Draft7).unwrap().0,
            Node::Accept
        );
    }

    #[test]
    fn type_first_then_document_order_then_combinators() {
        let schema = json!({
            "anyOf": [{"minLength": 1}, {"maxLength": 0}],
            "maxLength": 10,
            "not": {"const": "x"},
            "type": "string",
            "minLength": 2
        });
        let (node, _) = emit_root(&schema, Draft::Draft7).unwrap();
        assert_eq!(
            rules(&node),
            vec!["type", "maxLength", "minLength", "anyOf", "not"]
        );
    }

    #[test]
    fn ref_siblings_are_ignored() {
        let schema = json!({
            "properties": {"a": {"$ref": "#/definitions/s", "type": "integer"}},
            "definitions": {"s": {"type": "string"}}
        });
        let (node, _) = emit_root(&schema, Draft::Draft7).unwrap();
        let Node::Checks { checks } = node else { panic!("expected checks") };
        let Check::Properties { properties } = &checks[0] else { panic!("expected properties") };
        assert_eq!(
            properties[0].node,
            Node::Call {
                routine: "validate_definitions_s".into()
            }
        );
    }

    #[test]
    fn patterns_are_deduplicated() {
        let schema = json!({
            "pattern": "^a",
            "patternProperties": {"^a": true, "^b": false}
        });
        let (_, patterns) = emit_root(&schema, Draft::Draft7).unwrap();
        assert_eq!(patterns, vec!["^a", "^b"]);
    }

    #[test]
    fn invalid_subschema_is_a_compilation_error() {
        let err = emit_root(&json!({"not": 5}), Draft::Draft7).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Compilation(SchemaCompilationError::InvalidKeyword { ref keyword, .. }) if keyword == "not"
        ));
    }

    #[test]
    fn unknown_keywords_are_ignored() {
        let (node, _) = emit_root(&json!({"x-vendor": {"type": 1}, "minimum": 1}), Draft::Draft7).unwrap();
        assert_eq!(rules(&node), vec!["minimum"]);
    }
}
