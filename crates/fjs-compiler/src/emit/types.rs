//! `type`, `enum` and `const`.

use serde_json::Value;

use fjs_core::JsonKind;

use super::EmitContext;
use crate::error::CompileError;
use crate::ir::Check;

pub(super) fn emit_type(ctx: &EmitContext<'_>, value: &Value) -> Result<Check, CompileError> {
    let names: Vec<&str> = match value {
        Value::String(name) => vec![name.as_str()],
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| ctx.invalid("type", "expected a type name or an array of type names"))
            })
            .collect::<Result<_, _>>()?,
        _ => return Err(ctx.invalid("type", "expected a type name or an array of type names")),
    };
    let mut kinds = Vec::with_capacity(names.len());
    for name in names {
        let kind = JsonKind::from_name(name)
            .ok_or_else(|| ctx.invalid("type", format!("unknown type \"{name}\"")))?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(Check::Type { kinds })
}

pub(super) fn emit_enum(ctx: &EmitContext<'_>, value: &Value) -> Result<Check, CompileError> {
    let values = value
        .as_array()
        .ok_or_else(|| ctx.invalid("enum", "expected an array"))?;
    Ok(Check::Enum {
        values: values.clone(),
    })
}

pub(super) fn emit_const(value: &Value) -> Check {
    Check::Const {
        value: value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use crate::draft::Draft;
    use crate::emit::test_support::emit_root;
    use crate::error::CompileError;
    use crate::ir::{Check, Node};
    use fjs_core::JsonKind;
    use serde_json::json;

    #[test]
    fn type_list_is_deduplicated() {
        let (node, _) = emit_root(&json!({"type": ["string", "null", "string"]}), Draft::Draft7).unwrap();
        assert_eq!(
            node,
            Node::Checks {
                checks: vec![Check::Type {
                    kinds: vec![JsonKind::String, JsonKind::Null]
                }]
            }
        );
    }

    #[test]
    fn unknown_type_name_is_rejected() {
        let err = emit_root(&json!({"type": "float"}), Draft::Draft7).unwrap_err();
        assert!(matches!(err, CompileError::Compilation(_)));
        assert!(err.to_string().contains("float"));
    }

    #[test]
    fn enum_must_be_an_array() {
        assert!(emit_root(&json!({"enum": "a"}), Draft::Draft7).is_err());
    }

    #[test]
    fn const_is_ignored_before_draft6() {
        let (node, _) = emit_root(&json!({"const": 1}), Draft::Draft4).unwrap();
        assert_eq!(node, Node::Accept);
    }
}
