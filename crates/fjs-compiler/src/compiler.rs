//! # Schema Compiler
//!
//! Drives a compilation: choose the draft, resolve the scope graph, emit
//! one routine per scope in discovery order, reject same-value recursion,
//! then link the program into a [`ValidationArtifact`].
//!
//! Every routine name is known before any body is emitted, so bodies can
//! call routines that have not been compiled yet, including themselves.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info};

use crate::artifact::{Compatibility, Program, RoutineDef, ValidationArtifact, ARTIFACT_FORMAT};
use crate::draft::Draft;
use crate::emit::EmitContext;
use crate::error::{CompileError, SchemaCompilationError, SchemaResolutionError};
use crate::options::CompileOptions;
use crate::resolver::ScopeResolver;
use crate::retrieve::Handlers;

/// Compiles schemas with fixed options and retrieval handlers.
#[derive(Debug, Clone, Default)]
pub struct SchemaCompiler {
    options: CompileOptions,
    handlers: Handlers,
}

impl SchemaCompiler {
    /// A compiler with `options` and no retrieval handlers.
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            handlers: Handlers::new(),
        }
    }

    /// Use `handlers` to fetch documents outside the root schema.
    pub fn with_handlers(mut self, handlers: Handlers) -> Self {
        self.handlers = handlers;
        self
    }

    /// The compile options.
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile `schema` into a linked artifact.
    ///
    /// # Errors
    ///
    /// [`CompileError::Resolution`] when a reference cannot be followed,
    /// [`CompileError::Compilation`] when a keyword is malformed or routines
    /// recurse without consuming the value.
    pub fn compile(&self, schema: &Value) -> Result<ValidationArtifact, CompileError> {
        let program = self.program(schema)?;
        let entry_point = program.entry_point.clone();
        let routines = program.routines.len();
        let artifact = ValidationArtifact::assemble(program)?;
        info!(
            entry_point = %entry_point,
            routines,
            digest = %artifact.digest(),
            "schema compiled"
        );
        Ok(artifact)
    }

    /// Compile `schema` and render the persisted form.
    ///
    /// Returns `(source, entry point)`. The source is byte-identical for
    /// identical input.
    pub fn emit(&self, schema: &Value) -> Result<(String, String), CompileError> {
        let artifact = self.compile(schema)?;
        let source = artifact.to_source()?;
        Ok((source, artifact.entry_point().to_string()))
    }

    fn program(&self, schema: &Value) -> Result<Program, CompileError> {
        let draft = Draft::detect(schema).unwrap_or(self.options.default_draft);
        debug!(%draft, "compiling schema");
        let graph = ScopeResolver::new(&self.handlers, draft).resolve(schema)?;

        let mut ctx = EmitContext::new(&graph, &self.options);
        let mut routines = Vec::with_capacity(graph.len());
        for entry in graph.entries() {
            let node = graph
                .node(entry)
                .ok_or_else(|| SchemaResolutionError::PointerNotFound {
                    uri: entry.scope.uri.to_string(),
                    pointer: entry.scope.pointer.to_string(),
                })?;
            let body = ctx.routine(entry, node)?;
            debug!(routine = %entry.name, scope = %entry.scope, "emitted routine");
            routines.push(RoutineDef {
                name: entry.name.clone(),
                scope: entry.scope.to_string(),
                body,
            });
        }
        reject_same_value_cycles(&routines)?;

        Ok(Program {
            format: ARTIFACT_FORMAT.to_string(),
            draft,
            entry_point: graph.entry_point().to_string(),
            options: self.options.clone(),
            compatibility: Compatibility::default(),
            patterns: ctx.patterns.into_sources(),
            routines,
        })
    }
}

/// A routine that reaches itself through calls on the same value never
/// terminates once entered.
fn reject_same_value_cycles(routines: &[RoutineDef]) -> Result<(), SchemaCompilationError> {
    let edges: HashMap<&str, Vec<&str>> = routines
        .iter()
        .map(|routine| {
            let mut calls = Vec::new();
            routine.body.same_value_calls(&mut calls);
            (routine.name.as_str(), calls)
        })
        .collect();

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Active,
        Done,
    }
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut stack: Vec<&str> = Vec::new();

    fn visit<'a>(
        name: &'a str,
        edges: &HashMap<&'a str, Vec<&'a str>>,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
    ) -> Result<(), SchemaCompilationError> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Active) => {
                let start = stack.iter().position(|n| *n == name).unwrap_or(0);
                let mut chain: Vec<&str> = stack[start..].to_vec();
                chain.push(name);
                return Err(SchemaCompilationError::InfiniteRecursion {
                    routine: name.to_string(),
                    chain: chain.join(" -> "),
                });
            }
            None => {}
        }
        marks.insert(name, Mark::Active);
        stack.push(name);
        for &callee in edges.get(name).map(Vec::as_slice).unwrap_or_default() {
            visit(callee, edges, marks, stack)?;
        }
        stack.pop();
        marks.insert(name, Mark::Done);
        Ok(())
    }

    for routine in routines {
        visit(&routine.name, &edges, &mut marks, &mut stack)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(schema: Value) -> Result<ValidationArtifact, CompileError> {
        SchemaCompiler::default().compile(&schema)
    }

    #[test]
    fn root_schema_draft_overrides_options() {
        let compiler = SchemaCompiler::new(CompileOptions {
            default_draft: Draft::Draft7,
            ..CompileOptions::default()
        });
        let artifact = compiler
            .compile(&json!({"$schema": "http://json-schema.org/draft-04/schema#", "type": "integer"}))
            .unwrap();
        assert_eq!(artifact.draft(), Draft::Draft4);
        assert!(!artifact.is_valid(&json!(1.0)));
    }

    #[test]
    fn options_default_draft_applies_without_schema_keyword() {
        let compiler = SchemaCompiler::new(CompileOptions {
            default_draft: Draft::Draft6,
            ..CompileOptions::default()
        });
        let artifact = compiler.compile(&json!({"if": false, "then": false})).unwrap();
        assert_eq!(artifact.draft(), Draft::Draft6);
        assert!(artifact.is_valid(&json!(1)));
    }

    #[test]
    fn direct_self_reference_is_rejected() {
        let err = compile(json!({"$ref": "#"})).unwrap_err();
        match err {
            CompileError::Compilation(SchemaCompilationError::InfiniteRecursion { chain, .. }) => {
                assert_eq!(chain, "validate -> validate");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn combinator_cycle_is_rejected() {
        let schema = json!({
            "definitions": {
                "a": {"allOf": [{"$ref": "#/definitions/b"}]},
                "b": {"anyOf": [{"$ref": "#/definitions/a"}, {"type": "null"}]}
            },
            "$ref": "#/definitions/a"
        });
        let err = compile(schema).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Compilation(SchemaCompilationError::InfiniteRecursion { .. })
        ));
    }

    #[test]
    fn unreachable_self_calls_are_accepted() {
        let after_accept = compile(json!({"anyOf": [true, {"$ref": "#"}]})).unwrap();
        assert!(after_accept.is_valid(&json!("anything")));

        let behind_false_if = compile(json!({"if": false, "then": {"$ref": "#"}})).unwrap();
        assert!(behind_false_if.is_valid(&json!(1)));

        let behind_true_if = compile(json!({"if": true, "else": {"$ref": "#"}})).unwrap();
        assert!(behind_true_if.is_valid(&json!(1)));
    }

    #[test]
    fn self_call_before_an_accepting_branch_is_rejected() {
        let err = compile(json!({"anyOf": [{"$ref": "#"}, true]})).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Compilation(SchemaCompilationError::InfiniteRecursion { .. })
        ));
    }

    #[test]
    fn descending_recursion_is_accepted() {
        let artifact = compile(json!({
            "type": "object",
            "properties": {"child": {"$ref": "#"}}
        }))
        .unwrap();
        assert!(artifact.is_valid(&json!({"child": {"child": {}}})));
        assert_eq!(artifact.routine_names().collect::<Vec<_>>(), vec!["validate"]);
    }

    #[test]
    fn emit_returns_entry_point() {
        let (source, entry_point) = SchemaCompiler::default()
            .emit(&json!({"$id": "http://example.com/s.json", "type": "string"}))
            .unwrap();
        assert_eq!(entry_point, "validate_http_example_com_s_json");
        assert!(source.contains("\"entry_point\": \"validate_http_example_com_s_json\""));
    }
}
