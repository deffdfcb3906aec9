//! String keywords: `minLength`, `maxLength`, `pattern`, `format`.

use serde_json::Value;
use tracing::warn;

use super::EmitContext;
use crate::error::CompileError;
use crate::format;
use crate::ir::Check;

pub(super) fn emit(
    ctx: &mut EmitContext<'_>,
    keyword: &str,
    value: &Value,
) -> Result<Option<Check>, CompileError> {
    let check = match keyword {
        "minLength" => Check::MinLength {
            limit: ctx.count(keyword, value)?,
        },
        "maxLength" => Check::MaxLength {
            limit: ctx.count(keyword, value)?,
        },
        "pattern" => {
            let source = value
                .as_str()
                .ok_or_else(|| ctx.invalid(keyword, "expected a string"))?;
            Check::Pattern {
                pattern: ctx.pattern(source)?,
            }
        }
        "format" => {
            let name = value
                .as_str()
                .ok_or_else(|| ctx.invalid(keyword, "expected a string"))?;
            if !ctx.options.use_formats {
                return Ok(None);
            }
            if !format::is_known(name) {
                warn!(format = name, location = %ctx.location(), "unknown format ignored");
                return Ok(None);
            }
            Check::Format {
                format: name.to_string(),
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(check))
}
