//! `allOf`, `anyOf`, `oneOf`, `not` and `if`/`then`/`else`.
//!
//! `then` and `else` are compiled with their `if`; on their own they are
//! ignored.

use serde_json::{Map, Value};

use super::EmitContext;
use crate::error::CompileError;
use crate::ir::{Check, Node};

pub(super) fn emit(
    ctx: &mut EmitContext<'_>,
    schema: &Map<String, Value>,
    keyword: &str,
    value: &Value,
) -> Result<Option<Check>, CompileError> {
    let check = match keyword {
        "allOf" => Check::AllOf {
            branches: branches(ctx, keyword, value)?,
        },
        "anyOf" => Check::AnyOf {
            branches: branches(ctx, keyword, value)?,
        },
        "oneOf" => Check::OneOf {
            branches: branches(ctx, keyword, value)?,
        },
        "not" => Check::Not {
            node: Box::new(ctx.subschema(keyword, value, &["not"])?),
        },
        "if" => {
            let condition = ctx.subschema(keyword, value, &["if"])?;
            let then = optional(ctx, schema, "then")?;
            let otherwise = optional(ctx, schema, "else")?;
            if then.is_none() && otherwise.is_none() {
                return Ok(None);
            }
            Check::Conditional {
                condition: Box::new(condition),
                then,
                otherwise,
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(check))
}

fn branches(ctx: &mut EmitContext<'_>, keyword: &str, value: &Value) -> Result<Vec<Node>, CompileError> {
    let items = value
        .as_array()
        .filter(|items| !items.is_empty())
        .ok_or_else(|| ctx.invalid(keyword, "expected a non-empty array of schemas"))?;
    items
        .iter()
        .enumerate()
        .map(|(index, sub)| ctx.subschema(keyword, sub, &[keyword, index.to_string().as_str()]))
        .collect()
}

fn optional(
    ctx: &mut EmitContext<'_>,
    schema: &Map<String, Value>,
    keyword: &str,
) -> Result<Option<Box<Node>>, CompileError> {
    schema
        .get(keyword)
        .map(|sub| ctx.subschema(keyword, sub, &[keyword]).map(Box::new))
        .transpose()
}
