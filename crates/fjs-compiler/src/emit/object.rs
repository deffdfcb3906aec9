//! Object keywords.

use serde_json::{Map, Value};

use super::EmitContext;
use crate::error::CompileError;
use crate::ir::{Check, Dependency, Node, PatternRule, PropertyRule, Requirement};

pub(super) fn emit(
    ctx: &mut EmitContext<'_>,
    schema: &Map<String, Value>,
    keyword: &str,
    value: &Value,
) -> Result<Option<Check>, CompileError> {
    let check = match keyword {
        "required" => {
            let names = ctx.string_list(keyword, value)?;
            if names.is_empty() {
                return Ok(None);
            }
            Check::Required { names }
        }
        "minProperties" => Check::MinProperties {
            limit: ctx.count(keyword, value)?,
        },
        "maxProperties" => Check::MaxProperties {
            limit: ctx.count(keyword, value)?,
        },
        "properties" => {
            let declared = ctx.object(keyword, value)?;
            let mut properties = Vec::with_capacity(declared.len());
            for (name, sub) in declared {
                properties.push(PropertyRule {
                    name: name.clone(),
                    node: ctx.subschema(keyword, sub, &["properties", name.as_str()])?,
                    default: ctx.default_of(sub),
                });
            }
            Check::Properties { properties }
        }
        "patternProperties" => {
            let declared = ctx.object(keyword, value)?;
            let mut patterns = Vec::with_capacity(declared.len());
            for (source, sub) in declared {
                let pattern = ctx.pattern(source)?;
                patterns.push(PatternRule {
                    pattern,
                    node: ctx.subschema(keyword, sub, &["patternProperties", source.as_str()])?,
                });
            }
            Check::PatternProperties { patterns }
        }
        "additionalProperties" => {
            let node = ctx.subschema(keyword, value, &["additionalProperties"])?;
            if node == Node::Accept {
                return Ok(None);
            }
            let known = match schema.get("properties") {
                Some(Value::Object(declared)) => declared.keys().cloned().collect(),
                _ => Vec::new(),
            };
            let mut patterns = Vec::new();
            if let Some(Value::Object(declared)) = schema.get("patternProperties") {
                for source in declared.keys() {
                    patterns.push(ctx.pattern(source)?);
                }
            }
            Check::AdditionalProperties {
                known,
                patterns,
                node: Box::new(node),
            }
        }
        "propertyNames" => Check::PropertyNames {
            node: Box::new(ctx.subschema(keyword, value, &["propertyNames"])?),
        },
        "dependencies" => {
            let declared = ctx.object(keyword, value)?;
            let mut dependencies = Vec::with_capacity(declared.len());
            for (property, requirement) in declared {
                let requirement = match requirement {
                    Value::Array(_) => Requirement::Properties {
                        names: ctx.string_list(keyword, requirement)?,
                    },
                    _ => Requirement::Schema {
                        node: ctx.subschema(keyword, requirement, &["dependencies", property.as_str()])?,
                    },
                };
                dependencies.push(Dependency {
                    property: property.clone(),
                    requirement,
                });
            }
            Check::Dependencies { dependencies }
        }
        _ => return Ok(None),
    };
    Ok(Some(check))
}
