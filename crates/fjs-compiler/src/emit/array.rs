//! Array keywords.
//!
//! `additionalItems` only has meaning next to a tuple `items`; next to a
//! single-schema `items` it is ignored, and without `items` it is an error.

use serde_json::{Map, Value};

use super::EmitContext;
use crate::error::{CompileError, SchemaCompilationError};
use crate::ir::{Check, Node, TupleItem};

pub(super) fn emit(
    ctx: &mut EmitContext<'_>,
    schema: &Map<String, Value>,
    keyword: &str,
    value: &Value,
) -> Result<Option<Check>, CompileError> {
    let check = match keyword {
        "minItems" => Check::MinItems {
            limit: ctx.count(keyword, value)?,
        },
        "maxItems" => Check::MaxItems {
            limit: ctx.count(keyword, value)?,
        },
        "uniqueItems" => match value {
            Value::Bool(true) => Check::UniqueItems,
            Value::Bool(false) => return Ok(None),
            _ => return Err(ctx.invalid(keyword, "expected a boolean")),
        },
        "items" => match value {
            Value::Array(tuple) => {
                let mut items = Vec::with_capacity(tuple.len());
                for (index, sub) in tuple.iter().enumerate() {
                    let position = index.to_string();
                    items.push(TupleItem {
                        node: ctx.subschema(keyword, sub, &["items", position.as_str()])?,
                        default: ctx.default_of(sub),
                    });
                }
                Check::TupleItems { items }
            }
            _ => {
                let node = ctx.subschema(keyword, value, &["items"])?;
                if node == Node::Accept {
                    return Ok(None);
                }
                Check::Items {
                    node: Box::new(node),
                }
            }
        },
        "additionalItems" => match schema.get("items") {
            None => {
                return Err(SchemaCompilationError::AdditionalItemsWithoutItems {
                    location: ctx.location(),
                }
                .into())
            }
            Some(Value::Array(tuple)) => {
                let node = ctx.subschema(keyword, value, &["additionalItems"])?;
                if node == Node::Accept {
                    return Ok(None);
                }
                Check::AdditionalItems {
                    from: tuple.len(),
                    node: Box::new(node),
                }
            }
            Some(_) => return Ok(None),
        },
        "contains" => Check::Contains {
            node: Box::new(ctx.subschema(keyword, value, &["contains"])?),
        },
        _ => return Ok(None),
    };
    Ok(Some(check))
}

#[cfg(test)]
mod tests {
    use crate::draft::Draft;
    use crate::emit::test_support::emit_root;
    use crate::error::{CompileError, SchemaCompilationError};
    use crate::ir::{Check, Node, TupleItem};
    use serde_json::json;

    #[test]
    fn additional_items_without_items_is_an_error() {
        let err = emit_root(&json!({"additionalItems": false}), Draft::Draft7).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Compilation(SchemaCompilationError::AdditionalItemsWithoutItems { .. })
        ));
    }

    #[test]
    fn additional_items_next_to_single_items_is_ignored() {
        let (node, _) = emit_root(
            &json!({"items": {"type": "string"}, "additionalItems": false}),
            Draft::Draft7,
        )
        .unwrap();
        let Node::Checks { checks } = node else { panic!("expected checks") };
        assert_eq!(checks.len(), 1);
        assert!(matches!(checks[0], Check::Items { .. }));
    }

    #[test]
    fn tuple_items_carry_defaults() {
        let (node, _) = emit_root(
            &json!({"items": [{"type": "integer"}, {"default": "x"}], "additionalItems": false}),
            Draft::Draft7,
        )
        .unwrap();
        let Node::Checks { checks } = node else { panic!("expected checks") };
        let Check::TupleItems { items } = &checks[0] else { panic!("expected tuple") };
        assert_eq!(items[0].default, None);
        assert_eq!(
            items[1],
            TupleItem {
                node: Node::Accept,
                default: Some(json!("x"))
            }
        );
        assert!(matches!(checks[1], Check::AdditionalItems { from: 2, .. }));
    }

    #[test]
    fn unique_items_false_emits_nothing() {
        let (node, _) = emit_root(&json!({"uniqueItems": false}), Draft::Draft7).unwrap();
        assert_eq!(node, Node::Accept);
    }
}
