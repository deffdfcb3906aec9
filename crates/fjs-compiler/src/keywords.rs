//! Where subschemas live.
//!
//! The resolver (to discover references) and the base-URI tracker (to apply
//! `$id` along a pointer) must agree on which positions of a schema object
//! hold subschemas. Both read these tables.

use serde_json::{Map, Value};

use crate::draft::Draft;

/// Keywords whose value is one subschema.
pub(crate) const SINGLE_SCHEMA: &[&str] = &[
    "additionalItems",
    "additionalProperties",
    "contains",
    "propertyNames",
    "not",
    "if",
    "then",
    "else",
];

/// Keywords whose value is an array of subschemas.
pub(crate) const SCHEMA_LIST: &[&str] = &["allOf", "anyOf", "oneOf"];

/// Keywords whose value maps names to subschemas.
pub(crate) const SCHEMA_MAP: &[&str] = &["properties", "patternProperties", "dependencies"];

/// Keywords that are evaluated only after every other check of a routine.
pub(crate) const COMBINATORS: &[&str] = &["allOf", "anyOf", "oneOf", "not", "if"];

/// What a JSON location holds, from the point of view of `$id` scoping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    /// A schema (boolean or object).
    Schema,
    /// An object whose values are schemas (`properties`, `definitions`, ...).
    Map,
    /// An array whose elements are schemas (`allOf`, tuple `items`, ...).
    List,
    /// Plain data (`enum`, `default`, unknown keywords).
    Opaque,
}

impl Position {
    /// Position of the child at `token` under a node at `self`.
    pub(crate) fn child(self, node: &Value, token: &str) -> Position {
        match self {
            Position::Schema => keyword_position(node, token),
            Position::Map | Position::List => Position::Schema,
            Position::Opaque => Position::Opaque,
        }
    }
}

fn keyword_position(node: &Value, keyword: &str) -> Position {
    if SCHEMA_MAP.contains(&keyword) || keyword == "definitions" {
        return Position::Map;
    }
    if SCHEMA_LIST.contains(&keyword) {
        return Position::List;
    }
    if keyword == "items" {
        return match node.get("items") {
            Some(Value::Array(_)) => Position::List,
            _ => Position::Schema,
        };
    }
    if SINGLE_SCHEMA.contains(&keyword) {
        return Position::Schema;
    }
    Position::Opaque
}

/// Every subschema the compiler inlines into the routine of `schema`.
///
/// Returns `(relative pointer tokens, subschema)` pairs in document order.
/// `definitions` is excluded: its entries only matter when referenced.
/// Values of the wrong shape are skipped here and reported by the emitters.
pub(crate) fn inlined_subschemas<'a>(
    schema: &'a Map<String, Value>,
    draft: Draft,
) -> Vec<(Vec<String>, &'a Value)> {
    let mut out = Vec::new();
    for (keyword, value) in schema {
        if !draft.supports(keyword) {
            continue;
        }
        let keyword = keyword.as_str();
        if matches!(keyword, "then" | "else") && !schema.contains_key("if") {
            continue;
        }
        if keyword == "additionalItems" && !schema.get("items").is_some_and(Value::is_array) {
            continue;
        }
        if SINGLE_SCHEMA.contains(&keyword) {
            if is_schema(value) {
                out.push((vec![keyword.to_string()], value));
            }
        } else if SCHEMA_LIST.contains(&keyword) {
            push_list(&mut out, keyword, value);
        } else if keyword == "items" {
            if value.is_array() {
                push_list(&mut out, keyword, value);
            } else if is_schema(value) {
                out.push((vec![keyword.to_string()], value));
            }
        } else if SCHEMA_MAP.contains(&keyword) {
            if let Some(map) = value.as_object() {
                for (name, sub) in map {
                    if is_schema(sub) {
                        out.push((vec![keyword.to_string(), name.clone()], sub));
                    }
                }
            }
        }
    }
    out
}

fn push_list<'a>(out: &mut Vec<(Vec<String>, &'a Value)>, keyword: &str, value: &'a Value) {
    if let Some(items) = value.as_array() {
        for (index, sub) in items.iter().enumerate() {
            if is_schema(sub) {
                out.push((vec![keyword.to_string(), index.to_string()], sub));
            }
        }
    }
}

/// A schema is a boolean or an object.
pub(crate) fn is_schema(value: &Value) -> bool {
    value.is_boolean() || value.is_object()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inlined_subschemas_follow_document_order() {
        let schema = json!({
            "not": {"type": "null"},
            "properties": {"a": {"type": "string"}, "b": true},
            "definitions": {"unused": {"type": "number"}},
            "items": [{"type": "string"}, false],
            "dependencies": {"a": ["b"], "c": {"required": ["d"]}}
        });
        let subs = inlined_subschemas(schema.as_object().unwrap(), Draft::Draft7);
        let paths: Vec<String> = subs.iter().map(|(p, _)| p.join("/")).collect();
        assert_eq!(
            paths,
            vec![
                "not",
                "properties/a",
                "properties/b",
                "items/0",
                "items/1",
                "dependencies/c"
            ]
        );
    }

    #[test]
    fn ignored_positions_are_not_inlined() {
        let schema = json!({"then": {}, "items": {}, "additionalItems": {}});
        let subs = inlined_subschemas(schema.as_object().unwrap(), Draft::Draft7);
        let paths: Vec<String> = subs.iter().map(|(p, _)| p.join("/")).collect();
        assert_eq!(paths, vec!["items"]);
    }

    #[test]
    fn draft_gated_keywords_are_skipped() {
        let schema = json!({"contains": {"type": "string"}, "if": true});
        assert!(inlined_subschemas(schema.as_object().unwrap(), Draft::Draft4).is_empty());
        assert_eq!(
            inlined_subschemas(schema.as_object().unwrap(), Draft::Draft7).len(),
            2
        );
    }

    #[test]
    fn positions_track_containers() {
        let node = json!({"items": [true], "enum": [{"$id": "x"}]});
        assert_eq!(Position::Schema.child(&node, "items"), Position::List);
        assert_eq!(Position::Schema.child(&node, "enum"), Position::Opaque);
        assert_eq!(Position::Schema.child(&node, "definitions"), Position::Map);
        assert_eq!(Position::List.child(&node, "0"), Position::Schema);
        assert_eq!(Position::Opaque.child(&node, "0"), Position::Opaque);
    }
}
