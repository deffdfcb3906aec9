//! Numeric bounds: `minimum`, `maximum`, `exclusiveMinimum`,
//! `exclusiveMaximum` and `multipleOf`.
//!
//! Draft 4 spells exclusive bounds as booleans that modify `minimum` and
//! `maximum`; drafts 6 and 7 make them standalone numeric limits.

use serde_json::{Map, Value};

use super::EmitContext;
use crate::draft::Draft;
use crate::error::CompileError;
use crate::ir::Check;

pub(super) fn emit(
    ctx: &EmitContext<'_>,
    schema: &Map<String, Value>,
    keyword: &str,
    value: &Value,
) -> Result<Option<Check>, CompileError> {
    let check = match keyword {
        "minimum" => Check::Minimum {
            limit: ctx.number(keyword, value)?,
            exclusive: draft4_exclusive(ctx, schema, "exclusiveMinimum")?,
        },
        "maximum" => Check::Maximum {
            limit: ctx.number(keyword, value)?,
            exclusive: draft4_exclusive(ctx, schema, "exclusiveMaximum")?,
        },
        "exclusiveMinimum" | "exclusiveMaximum" if ctx.draft == Draft::Draft4 => {
            if !value.is_boolean() {
                return Err(ctx.invalid(keyword, "expected a boolean"));
            }
            return Ok(None);
        }
        "exclusiveMinimum" => Check::Minimum {
            limit: ctx.number(keyword, value)?,
            exclusive: true,
        },
        "exclusiveMaximum" => Check::Maximum {
            limit: ctx.number(keyword, value)?,
            exclusive: true,
        },
        "multipleOf" => {
            let factor = ctx.number(keyword, value)?;
            if factor.as_f64().map_or(true, |f| f <= 0.0) {
                return Err(ctx.invalid(keyword, "expected a number greater than 0"));
            }
            Check::MultipleOf { factor }
        }
        _ => return Ok(None),
    };
    Ok(Some(check))
}

fn draft4_exclusive(
    ctx: &EmitContext<'_>,
    schema: &Map<String, Value>,
    keyword: &str,
) -> Result<bool, CompileError> {
    if ctx.draft != Draft::Draft4 {
        return Ok(false);
    }
    match schema.get(keyword) {
        None => Ok(false),
        Some(Value::Bool(exclusive)) => Ok(*exclusive),
        Some(_) => Err(ctx.invalid(keyword, "expected a boolean")),
    }
}
