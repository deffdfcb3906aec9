//! # Routine IR
//!
//! The compiler's output before materialization. Each routine body is a
//! [`Node`]; an object schema becomes a [`Node::Checks`] list evaluated in
//! order, first failure wins.
//!
//! The IR is plain serde data. Its JSON form is the persisted artifact body,
//! and its canonical (JCS) bytes are what the artifact digest covers.
//! Patterns are referenced by index into the program's pattern table so
//! each regular expression is compiled once per artifact.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use fjs_core::JsonKind;

/// A routine body or inlined subschema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    /// `true` or `{}`: every value passes.
    Accept,
    /// `false`: no value passes.
    Reject,
    /// `$ref`: delegate to another routine with the same value and path.
    Call {
        /// Name of the called routine.
        routine: String,
    },
    /// Keyword checks, in evaluation order.
    Checks {
        /// The checks.
        checks: Vec<Check>,
    },
}

/// One keyword (or keyword group) check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Check {
    /// `type`.
    Type { kinds: Vec<JsonKind> },
    /// `enum`.
    Enum { values: Vec<Value> },
    /// `const`.
    Const { value: Value },
    /// `minimum`, or `exclusiveMinimum` when `exclusive`.
    Minimum { limit: Number, exclusive: bool },
    /// `maximum`, or `exclusiveMaximum` when `exclusive`.
    Maximum { limit: Number, exclusive: bool },
    /// `multipleOf`.
    MultipleOf { factor: Number },
    /// `minLength`, in code points.
    MinLength { limit: u64 },
    /// `maxLength`, in code points.
    MaxLength { limit: u64 },
    /// `pattern`; index into the pattern table.
    Pattern { pattern: usize },
    /// `format`, for a format the runtime knows.
    Format { format: String },
    /// `minItems`.
    MinItems { limit: u64 },
    /// `maxItems`.
    MaxItems { limit: u64 },
    /// `uniqueItems: true`.
    UniqueItems,
    /// `items` as a single schema.
    Items { node: Box<Node> },
    /// `items` as a tuple.
    TupleItems { items: Vec<TupleItem> },
    /// `additionalItems`, applied from position `from` on.
    AdditionalItems { from: usize, node: Box<Node> },
    /// `contains`.
    Contains { node: Box<Node> },
    /// `required`.
    Required { names: Vec<String> },
    /// `minProperties`.
    MinProperties { limit: u64 },
    /// `maxProperties`.
    MaxProperties { limit: u64 },
    /// `properties`.
    Properties { properties: Vec<PropertyRule> },
    /// `patternProperties`.
    PatternProperties { patterns: Vec<PatternRule> },
    /// `additionalProperties`: keys outside `known` that match none of `patterns`.
    AdditionalProperties {
        known: Vec<String>,
        patterns: Vec<usize>,
        node: Box<Node>,
    },
    /// `propertyNames`.
    PropertyNames { node: Box<Node> },
    /// `dependencies`.
    Dependencies { dependencies: Vec<Dependency> },
    /// `allOf`.
    AllOf { branches: Vec<Node> },
    /// `anyOf`.
    AnyOf { branches: Vec<Node> },
    /// `oneOf`.
    OneOf { branches: Vec<Node> },
    /// `not`.
    Not { node: Box<Node> },
    /// `if` / `then` / `else`.
    Conditional {
        condition: Box<Node>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        then: Option<Box<Node>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        otherwise: Option<Box<Node>>,
    },
}

/// One position of a tuple `items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleItem {
    /// Schema for the position.
    pub node: Node,
    /// Value appended when the array ends just before this position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// One entry of `properties`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRule {
    /// Property name.
    pub name: String,
    /// Schema for the property value.
    pub node: Node,
    /// Value inserted when the property is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// One entry of `patternProperties`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRule {
    /// Index into the pattern table.
    pub pattern: usize,
    /// Schema for matching property values.
    pub node: Node,
}

/// One entry of `dependencies`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    /// The property whose presence triggers the requirement.
    pub property: String,
    /// What must hold when it is present.
    pub requirement: Requirement,
}

/// Property dependency or schema dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Requirement {
    /// These properties must be present too.
    Properties { names: Vec<String> },
    /// The whole object must satisfy this schema.
    Schema { node: Node },
}

impl Node {
    /// Routines this node runs against the very value it was given.
    ///
    /// Checks that descend into elements or properties are not included: a
    /// cycle through them consumes part of the value on every turn.
    pub(crate) fn same_value_calls<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Node::Accept | Node::Reject => {}
            Node::Call { routine } => out.push(routine),
            Node::Checks { checks } => {
                for check in checks {
                    check.same_value_calls(out);
                }
            }
        }
    }
}

impl Check {
    fn same_value_calls<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Check::AllOf { branches } | Check::OneOf { branches } => {
                for branch in branches {
                    branch.same_value_calls(out);
                }
            }
            // Branches after an accepting one are never evaluated.
            Check::AnyOf { branches } => {
                for branch in branches {
                    branch.same_value_calls(out);
                    if *branch == Node::Accept {
                        break;
                    }
                }
            }
            Check::Not { node } => node.same_value_calls(out),
            Check::Conditional {
                condition,
                then,
                otherwise,
            } => {
                condition.same_value_calls(out);
                let taken = match **condition {
                    Node::Accept => [then.as_ref(), None],
                    Node::Reject => [None, otherwise.as_ref()],
                    _ => [then.as_ref(), otherwise.as_ref()],
                };
                for branch in taken.into_iter().flatten() {
                    branch.same_value_calls(out);
                }
            }
            Check::Dependencies { dependencies } => {
                for dependency in dependencies {
                    if let Requirement::Schema { node } = &dependency.requirement {
                        node.same_value_calls(out);
                    }
                }
            }
            _ => {}
        }
    }

    /// Keyword reported when this check fails.
    pub fn rule(&self) -> &'static str {
        match self {
            Check::Type { .. } => "type",
            Check::Enum { .. } => "enum",
            Check::Const { .. } => "const",
            Check::Minimum {
                exclusive: false, ..
            } => "minimum",
            Check::Minimum { exclusive: true, .. } => "exclusiveMinimum",
            Check::Maximum {
                exclusive: false, ..
            } => "maximum",
            Check::Maximum { exclusive: true, .. } => "exclusiveMaximum",
            Check::MultipleOf { .. } => "multipleOf",
            Check::MinLength { .. } => "minLength",
            Check::MaxLength { .. } => "maxLength",
            Check::Pattern { .. } => "pattern",
            Check::Format { .. } => "format",
            Check::MinItems { .. } => "minItems",
            Check::MaxItems { .. } => "maxItems",
            Check::UniqueItems => "uniqueItems",
            Check::Items { .. } | Check::TupleItems { .. } => "items",
            Check::AdditionalItems { .. } => "additionalItems",
            Check::Contains { .. } => "contains",
            Check::Required { .. } => "required",
            Check::MinProperties { .. } => "minProperties",
            Check::MaxProperties { .. } => "maxProperties",
            Check::Properties { .. } => "properties",
            Check::PatternProperties { .. } => "patternProperties",
            Check::AdditionalProperties { .. } => "additionalProperties",
            Check::PropertyNames { .. } => "propertyNames",
            Check::Dependencies { .. } => "dependencies",
            Check::AllOf { .. } => "allOf",
            Check::AnyOf { .. } => "anyOf",
            Check::OneOf { .. } => "oneOf",
            Check::Not { .. } => "not",
            Check::Conditional { .. } => "if",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nodes_serialize_with_tags() {
        let node = Node::Checks {
            checks: vec![
                Check::Type {
                    kinds: vec![JsonKind::String],
                },
                Check::MinLength { limit: 2 },
            ],
        };
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({
                "node": "checks",
                "checks": [
                    {"check": "type", "kinds": ["string"]},
                    {"check": "min_length", "limit": 2}
                ]
            })
        );
        let back: Node = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn same_value_calls_skip_descending_checks() {
        let node = Node::Checks {
            checks: vec![
                Check::Items {
                    node: Box::new(Node::Call {
                        routine: "validate_items".into(),
                    }),
                },
                Check::AllOf {
                    branches: vec![Node::Call {
                        routine: "validate_branch".into(),
                    }],
                },
                Check::Not {
                    node: Box::new(Node::Call {
                        routine: "validate_not".into(),
                    }),
                },
            ],
        };
        let mut calls = Vec::new();
        node.same_value_calls(&mut calls);
        assert_eq!(calls, vec!["validate_branch", "validate_not"]);
    }

    #[test]
    fn same_value_calls_skip_unreachable_branches() {
        let call = |name: &str| Node::Call {
            routine: name.into(),
        };
        let node = Node::Checks {
            checks: vec![
                Check::AnyOf {
                    branches: vec![call("validate_first"), Node::Accept, call("validate_late")],
                },
                Check::Conditional {
                    condition: Box::new(Node::Reject),
                    then: Some(Box::new(call("validate_then"))),
                    otherwise: Some(Box::new(call("validate_else"))),
                },
            ],
        };
        let mut calls = Vec::new();
        node.same_value_calls(&mut calls);
        assert_eq!(calls, vec!["validate_first", "validate_else"]);
    }

    #[test]
    fn exclusive_bounds_report_their_keyword() {
        let check = Check::Minimum {
            limit: Number::from(3),
            exclusive: true,
        };
        assert_eq!(check.rule(), "exclusiveMinimum");
    }
}
