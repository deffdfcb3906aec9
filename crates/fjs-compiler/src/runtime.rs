//! # Runtime
//!
//! Materializes routine IR into closures. Every routine becomes one boxed
//! closure in a table indexed by position; `$ref` calls are resolved to
//! table indices at link time, so recursion is an ordinary indexed call
//! through the [`Runtime`] handed to every closure.
//!
//! ## Invariants
//!
//! - The runtime is immutable after linking and shared across threads.
//!   Each invocation owns its value and its path accumulator.
//! - A check pushes a path segment before descending and pops it after,
//!   on success and on failure alike.
//! - Branch evaluation that may be discarded (`anyOf`, `oneOf`, `not`,
//!   `if`, `contains`) runs on a copy; only a committed branch's copy
//!   replaces the value.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use serde_json::{Number, Value};

use fjs_core::{json_equal, json_kind, JsonKind};

use crate::draft::Draft;
use crate::error::{DataValidationError, LinkError, PathSegment};
use crate::format;
use crate::ir::{Check, Dependency, Node, PatternRule, PropertyRule, Requirement, TupleItem};

type Path = Vec<PathSegment>;
type Outcome = Result<(), DataValidationError>;

/// A materialized routine or check.
pub(crate) type Validator = Box<dyn Fn(&Runtime, &mut Value, &mut Path) -> Outcome + Send + Sync>;

/// Linked routines of one artifact.
pub(crate) struct Runtime {
    routines: Vec<Validator>,
    names: Vec<String>,
    entry: usize,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("routines", &self.names)
            .field("entry", &self.names.get(self.entry))
            .finish()
    }
}

impl Runtime {
    /// Link `routines` (name, body) into closures.
    pub(crate) fn link<'a>(
        draft: Draft,
        routines: impl IntoIterator<Item = (&'a str, &'a Node)>,
        patterns: &[String],
        entry_point: &str,
    ) -> Result<Self, LinkError> {
        let routines: Vec<(&str, &Node)> = routines.into_iter().collect();
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(routines.len());
        for (i, (name, _)) in routines.iter().enumerate() {
            if index.insert(*name, i).is_some() {
                return Err(LinkError::DuplicateRoutine(name.to_string()));
            }
        }
        let patterns = patterns
            .iter()
            .map(|source| {
                Regex::new(source).map_err(|e| LinkError::InvalidPattern {
                    pattern: source.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let linker = Linker {
            index: &index,
            patterns: &patterns,
            integral_floats: draft.integral_floats_are_integers(),
        };
        let entry = *index
            .get(entry_point)
            .ok_or_else(|| LinkError::UnknownEntryPoint(entry_point.to_string()))?;
        let compiled = routines
            .iter()
            .map(|(_, body)| linker.node(body))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            routines: compiled,
            names: routines.iter().map(|(name, _)| name.to_string()).collect(),
            entry,
        })
    }

    /// Run the entry routine on `value`.
    pub(crate) fn run(&self, value: &mut Value) -> Outcome {
        let mut path = Vec::new();
        self.call(self.entry, value, &mut path)
    }

    fn call(&self, routine: usize, value: &mut Value, path: &mut Path) -> Outcome {
        (self.routines[routine])(self, value, path)
    }
}

struct Linker<'a> {
    index: &'a HashMap<&'a str, usize>,
    patterns: &'a [Regex],
    integral_floats: bool,
}

impl Linker<'_> {
    fn node(&self, node: &Node) -> Result<Validator, LinkError> {
        let validator: Validator = match node {
            Node::Accept => Box::new(|_, _, _| Ok(())),
            Node::Reject => Box::new(|_, _, path| Err(DataValidationError::new(path, "false", "must not be there"))),
            Node::Call { routine } => {
                let target = *self
                    .index
                    .get(routine.as_str())
                    .ok_or_else(|| LinkError::UnknownRoutine(routine.clone()))?;
                Box::new(move |rt, value, path| rt.call(target, value, path))
            }
            Node::Checks { checks } => {
                let checks = checks
                    .iter()
                    .map(|check| self.check(check))
                    .collect::<Result<Vec<_>, _>>()?;
                Box::new(move |rt, value, path| {
                    for check in &checks {
                        check(rt, value, path)?;
                    }
                    Ok(())
                })
            }
        };
        Ok(validator)
    }

    fn pattern(&self, index: usize) -> Result<Regex, LinkError> {
        self.patterns
            .get(index)
            .cloned()
            .ok_or(LinkError::UnknownPattern(index))
    }

    fn check(&self, check: &Check) -> Result<Validator, LinkError> {
        let rule = check.rule();
        let validator: Validator = match check {
            Check::Type { kinds } => {
                let kinds = kinds.clone();
                let integral_floats = self.integral_floats;
                let requirement = format!(
                    "must be {}",
                    kinds.iter().map(JsonKind::as_str).collect::<Vec<_>>().join(" or ")
                );
                Box::new(move |_, value, path| {
                    if kinds.iter().any(|kind| is_kind(value, *kind, integral_floats)) {
                        Ok(())
                    } else {
                        Err(DataValidationError::new(path, rule, &requirement))
                    }
                })
            }
            Check::Enum { values } => {
                let values = values.clone();
                let requirement = format!("must be one of {}", Value::Array(values.clone()));
                Box::new(move |_, value, path| {
                    if values.iter().any(|allowed| json_equal(allowed, value)) {
                        Ok(())
                    } else {
                        Err(DataValidationError::new(path, rule, &requirement))
                    }
                })
            }
            Check::Const { value: constant } => {
                let constant = constant.clone();
                Box::new(move |_, value, path| {
                    if json_equal(&constant, value) {
                        Ok(())
                    } else {
                        Err(DataValidationError::new(
                            path,
                            rule,
                            format!("must be same as const definition: {constant}"),
                        ))
                    }
                })
            }
            Check::Minimum { limit, exclusive } => {
                let (limit, exclusive) = (limit.clone(), *exclusive);
                let requirement = if exclusive {
                    format!("must be bigger than {limit}")
                } else {
                    format!("must be bigger than or equal to {limit}")
                };
                Box::new(move |_, value, path| match value {
                    Value::Number(n) => match compare(n, &limit) {
                        Some(Ordering::Greater) => Ok(()),
                        Some(Ordering::Equal) if !exclusive => Ok(()),
                        _ => Err(DataValidationError::new(path, rule, &requirement)),
                    },
                    _ => Ok(()),
                })
            }
            Check::Maximum { limit, exclusive } => {
                let (limit, exclusive) = (limit.clone(), *exclusive);
                let requirement = if exclusive {
                    format!("must be smaller than {limit}")
                } else {
                    format!("must be smaller than or equal to {limit}")
                };
                Box::new(move |_, value, path| match value {
                    Value::Number(n) => match compare(n, &limit) {
                        Some(Ordering::Less) => Ok(()),
                        Some(Ordering::Equal) if !exclusive => Ok(()),
                        _ => Err(DataValidationError::new(path, rule, &requirement)),
                    },
                    _ => Ok(()),
                })
            }
            Check::MultipleOf { factor } => {
                let factor = factor.clone();
                Box::new(move |_, value, path| match value {
                    Value::Number(n) if !is_multiple(n, &factor) => Err(DataValidationError::new(
                        path,
                        rule,
                        format!("must be multiple of {factor}"),
                    )),
                    _ => Ok(()),
                })
            }
            Check::MinLength { limit } => {
                let limit = *limit;
                Box::new(move |_, value, path| match value {
                    Value::String(s) if (s.chars().count() as u64) < limit => Err(DataValidationError::new(
                        path,
                        rule,
                        format!("must be longer than or equal to {limit} characters"),
                    )),
                    _ => Ok(()),
                })
            }
            Check::MaxLength { limit } => {
                let limit = *limit;
                Box::new(move |_, value, path| match value {
                    Value::String(s) if (s.chars().count() as u64) > limit => Err(DataValidationError::new(
                        path,
                        rule,
                        format!("must be shorter than or equal to {limit} characters"),
                    )),
                    _ => Ok(()),
                })
            }
            Check::Pattern { pattern } => {
                let regex = self.pattern(*pattern)?;
                Box::new(move |_, value, path| match value {
                    Value::String(s) if !regex.is_match(s) => Err(DataValidationError::new(
                        path,
                        rule,
                        format!("must match pattern {}", regex.as_str()),
                    )),
                    _ => Ok(()),
                })
            }
            Check::Format { format: name } => {
                let name = name.clone();
                Box::new(move |_, value, path| match value {
                    Value::String(s) if !format::conforms(&name, s) => {
                        Err(DataValidationError::new(path, rule, format!("must be {name}")))
                    }
                    _ => Ok(()),
                })
            }
            Check::MinItems { limit } => {
                let limit = *limit;
                Box::new(move |_, value, path| match value {
                    Value::Array(items) if (items.len() as u64) < limit => Err(DataValidationError::new(
                        path,
                        rule,
                        format!("must contain at least {limit} items"),
                    )),
                    _ => Ok(()),
                })
            }
            Check::MaxItems { limit } => {
                let limit = *limit;
                Box::new(move |_, value, path| match value {
                    Value::Array(items) if (items.len() as u64) > limit => Err(DataValidationError::new(
                        path,
                        rule,
                        format!("must contain less than or equal to {limit} items"),
                    )),
                    _ => Ok(()),
                })
            }
            Check::UniqueItems => Box::new(move |_, value, path| match value {
                Value::Array(items) if !all_unique(items) => {
                    Err(DataValidationError::new(path, rule, "must contain unique items"))
                }
                _ => Ok(()),
            }),
            Check::Items { node } => {
                let item = self.node(node)?;
                Box::new(move |rt, value, path| {
                    if let Value::Array(items) = value {
                        for (index, element) in items.iter_mut().enumerate() {
                            descend(path, PathSegment::Index(index), |path| item(rt, element, path))?;
                        }
                    }
                    Ok(())
                })
            }
            Check::TupleItems { items } => self.tuple(items)?,
            Check::AdditionalItems { from, node } => {
                let from = *from;
                if **node == Node::Reject {
                    Box::new(move |_, value, path| match value {
                        Value::Array(items) if items.len() > from => Err(DataValidationError::new(
                            path,
                            rule,
                            "must contain only specified items",
                        )),
                        _ => Ok(()),
                    })
                } else {
                    let item = self.node(node)?;
                    Box::new(move |rt, value, path| {
                        if let Value::Array(items) = value {
                            for (index, element) in items.iter_mut().enumerate().skip(from) {
                                descend(path, PathSegment::Index(index), |path| item(rt, element, path))?;
                            }
                        }
                        Ok(())
                    })
                }
            }
            Check::Contains { node } => {
                let item = self.node(node)?;
                Box::new(move |rt, value, path| match value {
                    Value::Array(items) => {
                        let found = items.iter().enumerate().any(|(index, element)| {
                            let mut scratch = element.clone();
                            descend(path, PathSegment::Index(index), |path| item(rt, &mut scratch, path)).is_ok()
                        });
                        if found {
                            Ok(())
                        } else {
                            Err(DataValidationError::new(path, rule, "must contain one of contains definition"))
                        }
                    }
                    _ => Ok(()),
                })
            }
            Check::Required { names } => {
                let names = names.clone();
                Box::new(move |_, value, path| match value {
                    Value::Object(map) => {
                        let missing: Vec<&String> = names.iter().filter(|name| !map.contains_key(*name)).collect();
                        if missing.is_empty() {
                            Ok(())
                        } else {
                            Err(DataValidationError::new(
                                path,
                                rule,
                                format!("must contain {} properties", render_names(&missing)),
                            ))
                        }
                    }
                    _ => Ok(()),
                })
            }
            Check::MinProperties { limit } => {
                let limit = *limit;
                Box::new(move |_, value, path| match value {
                    Value::Object(map) if (map.len() as u64) < limit => Err(DataValidationError::new(
                        path,
                        rule,
                        format!("must contain at least {limit} properties"),
                    )),
                    _ => Ok(()),
                })
            }
            Check::MaxProperties { limit } => {
                let limit = *limit;
                Box::new(move |_, value, path| match value {
                    Value::Object(map) if (map.len() as u64) > limit => Err(DataValidationError::new(
                        path,
                        rule,
                        format!("must contain less than or equal to {limit} properties"),
                    )),
                    _ => Ok(()),
                })
            }
            Check::Properties { properties } => self.properties(properties)?,
            Check::PatternProperties { patterns } => self.pattern_properties(patterns)?,
            Check::AdditionalProperties { known, patterns, node } => {
                let known = known.clone();
                let patterns = patterns
                    .iter()
                    .map(|&index| self.pattern(index))
                    .collect::<Result<Vec<_>, _>>()?;
                let is_additional =
                    move |key: &str| !known.iter().any(|k| k == key) && !patterns.iter().any(|re| re.is_match(key));
                if **node == Node::Reject {
                    Box::new(move |_, value, path| match value {
                        Value::Object(map) => {
                            let extra: Vec<&String> = map.keys().filter(|key| is_additional(key)).collect();
                            if extra.is_empty() {
                                Ok(())
                            } else {
                                Err(DataValidationError::new(
                                    path,
                                    rule,
                                    format!("must not contain {} properties", render_names(&extra)),
                                ))
                            }
                        }
                        _ => Ok(()),
                    })
                } else {
                    let member = self.node(node)?;
                    Box::new(move |rt, value, path| {
                        if let Value::Object(map) = value {
                            for (key, member_value) in map.iter_mut() {
                                if is_additional(key) {
                                    descend(path, PathSegment::Key(key.clone()), |path| {
                                        member(rt, member_value, path)
                                    })?;
                                }
                            }
                        }
                        Ok(())
                    })
                }
            }
            Check::PropertyNames { node } => {
                let name_check = self.node(node)?;
                Box::new(move |rt, value, path| {
                    if let Value::Object(map) = value {
                        for key in map.keys() {
                            let mut name = Value::String(key.clone());
                            descend(path, PathSegment::Key(key.clone()), |path| name_check(rt, &mut name, path))?;
                        }
                    }
                    Ok(())
                })
            }
            Check::Dependencies { dependencies } => self.dependencies(dependencies)?,
            Check::AllOf { branches } => {
                let branches = self.branches(branches)?;
                Box::new(move |rt, value, path| {
                    for branch in &branches {
                        branch(rt, value, path)?;
                    }
                    Ok(())
                })
            }
            Check::AnyOf { branches } => {
                let branches = self.branches(branches)?;
                Box::new(move |rt, value, path| {
                    for branch in &branches {
                        let mut candidate = value.clone();
                        if branch(rt, &mut candidate, path).is_ok() {
                            *value = candidate;
                            return Ok(());
                        }
                    }
                    Err(DataValidationError::new(path, rule, "must be valid by one of anyOf definition"))
                })
            }
            Check::OneOf { branches } => {
                let branches = self.branches(branches)?;
                Box::new(move |rt, value, path| {
                    let mut accepted = None;
                    let mut matches = 0usize;
                    for branch in &branches {
                        let mut candidate = value.clone();
                        if branch(rt, &mut candidate, path).is_ok() {
                            matches += 1;
                            if matches > 1 {
                                break;
                            }
                            accepted = Some(candidate);
                        }
                    }
                    match (matches, accepted) {
                        (1, Some(candidate)) => {
                            *value = candidate;
                            Ok(())
                        }
                        _ => Err(DataValidationError::new(
                            path,
                            rule,
                            format!("must be valid exactly by one definition ({matches} matches found)"),
                        )),
                    }
                })
            }
            Check::Not { node } => {
                let negated = self.node(node)?;
                Box::new(move |rt, value, path| {
                    let mut scratch = value.clone();
                    if negated(rt, &mut scratch, path).is_ok() {
                        Err(DataValidationError::new(path, rule, "must NOT match a disallowed definition"))
                    } else {
                        Ok(())
                    }
                })
            }
            Check::Conditional {
                condition,
                then,
                otherwise,
            } => {
                let condition = self.node(condition)?;
                let then = then.as_deref().map(|node| self.node(node)).transpose()?;
                let otherwise = otherwise.as_deref().map(|node| self.node(node)).transpose()?;
                Box::new(move |rt, value, path| {
                    let mut scratch = value.clone();
                    let branch = if condition(rt, &mut scratch, path).is_ok() {
                        &then
                    } else {
                        &otherwise
                    };
                    match branch {
                        Some(branch) => branch(rt, value, path),
                        None => Ok(()),
                    }
                })
            }
        };
        Ok(validator)
    }

    fn branches(&self, branches: &[Node]) -> Result<Vec<Validator>, LinkError> {
        branches.iter().map(|branch| self.node(branch)).collect()
    }

    fn tuple(&self, items: &[TupleItem]) -> Result<Validator, LinkError> {
        let positions = items
            .iter()
            .map(|item| Ok((self.node(&item.node)?, item.default.clone())))
            .collect::<Result<Vec<_>, LinkError>>()?;
        let validator: Validator = Box::new(move |rt, value, path| {
            if let Value::Array(elements) = value {
                for (index, (position, default)) in positions.iter().enumerate() {
                    if index == elements.len() {
                        match default {
                            Some(default) => elements.push(default.clone()),
                            None => break,
                        }
                    }
                    descend(path, PathSegment::Index(index), |path| {
                        position(rt, &mut elements[index], path)
                    })?;
                }
            }
            Ok(())
        });
        Ok(validator)
    }

    fn properties(&self, properties: &[PropertyRule]) -> Result<Validator, LinkError> {
        let rules = properties
            .iter()
            .map(|rule| Ok((rule.name.clone(), self.node(&rule.node)?, rule.default.clone())))
            .collect::<Result<Vec<_>, LinkError>>()?;
        let validator: Validator = Box::new(move |rt, value, path| {
            if let Value::Object(map) = value {
                for (name, member, default) in &rules {
                    if !map.contains_key(name) {
                        match default {
                            Some(default) => {
                                map.insert(name.clone(), default.clone());
                            }
                            None => continue,
                        }
                    }
                    if let Some(member_value) = map.get_mut(name) {
                        descend(path, PathSegment::Key(name.clone()), |path| {
                            member(rt, member_value, path)
                        })?;
                    }
                }
            }
            Ok(())
        });
        Ok(validator)
    }

    fn pattern_properties(&self, patterns: &[PatternRule]) -> Result<Validator, LinkError> {
        let rules = patterns
            .iter()
            .map(|rule| Ok((self.pattern(rule.pattern)?, self.node(&rule.node)?)))
            .collect::<Result<Vec<_>, LinkError>>()?;
        let validator: Validator = Box::new(move |rt, value, path| {
            if let Value::Object(map) = value {
                for (regex, member) in &rules {
                    for (key, member_value) in map.iter_mut() {
                        if regex.is_match(key) {
                            descend(path, PathSegment::Key(key.clone()), |path| {
                                member(rt, member_value, path)
                            })?;
                        }
                    }
                }
            }
            Ok(())
        });
        Ok(validator)
    }

    fn dependencies(&self, dependencies: &[Dependency]) -> Result<Validator, LinkError> {
        enum Linked {
            Properties(Vec<String>),
            Schema(Validator),
        }
        let linked = dependencies
            .iter()
            .map(|dependency| {
                let requirement = match &dependency.requirement {
                    Requirement::Properties { names } => Linked::Properties(names.clone()),
                    Requirement::Schema { node } => Linked::Schema(self.node(node)?),
                };
                Ok((dependency.property.clone(), requirement))
            })
            .collect::<Result<Vec<_>, LinkError>>()?;
        let validator: Validator = Box::new(move |rt, value, path| {
            for (property, requirement) in &linked {
                let present = value.as_object().is_some_and(|map| map.contains_key(property));
                if !present {
                    continue;
                }
                match requirement {
                    Linked::Properties(names) => {
                        let missing: Vec<&String> = names
                            .iter()
                            .filter(|name| !value.as_object().is_some_and(|map| map.contains_key(*name)))
                            .collect();
                        if !missing.is_empty() {
                            return Err(DataValidationError::new(
                                path,
                                "dependencies",
                                format!("must contain {} properties", render_names(&missing)),
                            ));
                        }
                    }
                    Linked::Schema(schema) => schema(rt, value, path)?,
                }
            }
            Ok(())
        });
        Ok(validator)
    }
}

fn descend<T>(path: &mut Path, segment: PathSegment, f: impl FnOnce(&mut Path) -> T) -> T {
    path.push(segment);
    let result = f(path);
    path.pop();
    result
}

fn is_kind(value: &Value, kind: JsonKind, integral_floats: bool) -> bool {
    match kind {
        JsonKind::Number => value.is_number(),
        JsonKind::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => true,
            Value::Number(n) => integral_floats && n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0),
            _ => false,
        },
        other => json_kind(value) == other,
    }
}

fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Numeric order: exact for integers, `f64` otherwise.
fn compare(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_integer(a), as_integer(b)) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

fn is_multiple(value: &Number, factor: &Number) -> bool {
    if let (Some(v), Some(f)) = (as_integer(value), as_integer(factor)) {
        return f != 0 && v % f == 0;
    }
    let (Some(v), Some(f)) = (value.as_f64(), factor.as_f64()) else {
        return false;
    };
    let quotient = v / f;
    if !quotient.is_finite() {
        return false;
    }
    (quotient - quotient.round()).abs() <= 1e-9 * quotient.abs().max(1.0)
}

fn all_unique(items: &[Value]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(i, a)| items[i + 1..].iter().all(|b| !json_equal(a, b)))
}

fn render_names(names: &[&String]) -> String {
    Value::Array(names.iter().map(|name| Value::String((*name).clone())).collect()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn link(body: Node, draft: Draft) -> Runtime {
        Runtime::link(draft, [("validate", &body)], &[], "validate").unwrap()
    }

    fn checks(checks: Vec<Check>) -> Node {
        Node::Checks { checks }
    }

    #[test]
    fn duplicate_routine_names_do_not_link() {
        let body = Node::Accept;
        let err = Runtime::link(
            Draft::Draft7,
            [("validate", &body), ("validate_a", &body), ("validate_a", &body)],
            &[],
            "validate",
        )
        .unwrap_err();
        assert!(matches!(err, LinkError::DuplicateRoutine(name) if name == "validate_a"));
    }

    #[test]
    fn integral_floats_depend_on_draft() {
        let body = checks(vec![Check::Type {
            kinds: vec![JsonKind::Integer],
        }]);
        assert!(link(body.clone(), Draft::Draft7).run(&mut json!(1.0)).is_ok());
        assert!(link(body, Draft::Draft4).run(&mut json!(1.0)).is_err());
    }

    #[test]
    fn booleans_are_not_numbers() {
        let runtime = link(
            checks(vec![Check::Type {
                kinds: vec![JsonKind::Number],
            }]),
            Draft::Draft7,
        );
        let err = runtime.run(&mut json!(true)).unwrap_err();
        assert_eq!(err.message, "data must be number");
    }

    #[test]
    fn bounds_compare_large_integers_exactly() {
        let runtime = link(
            checks(vec![Check::Maximum {
                limit: Number::from(u64::MAX),
                exclusive: true,
            }]),
            Draft::Draft7,
        );
        assert!(runtime.run(&mut json!(u64::MAX - 1)).is_ok());
        assert!(runtime.run(&mut json!(u64::MAX)).is_err());
        assert!(runtime.run(&mut json!(-5)).is_ok());
    }

    #[test]
    fn multiple_of_uses_tolerance_for_floats() {
        let factor = Number::from_f64(0.01).unwrap();
        assert!(is_multiple(&Number::from_f64(0.07).unwrap(), &factor));
        assert!(is_multiple(&Number::from_f64(19.99).unwrap(), &factor));
        assert!(!is_multiple(&Number::from_f64(0.075).unwrap(), &factor));
        assert!(is_multiple(&Number::from(10), &Number::from(5)));
        assert!(!is_multiple(&Number::from(7), &Number::from(2)));
        assert!(!is_multiple(
            &Number::from_f64(1e308).unwrap(),
            &Number::from_f64(1e-308).unwrap()
        ));
    }

    #[test]
    fn unique_items_uses_numeric_equality() {
        assert!(!all_unique(&[json!(1), json!(1.0)]));
        assert!(all_unique(&[json!(1), json!("1"), json!(true)]));
    }

    #[test]
    fn path_is_restored_after_failure() {
        let body = checks(vec![Check::Items {
            node: Box::new(Node::Reject),
        }]);
        let runtime = link(body, Draft::Draft7);
        let mut path = Vec::new();
        let err = runtime.call(0, &mut json!([1]), &mut path).unwrap_err();
        assert_eq!(err.path, vec![PathSegment::Index(0)]);
        assert!(path.is_empty());
    }

    #[test]
    fn any_of_discards_rejected_branch_transformations() {
        let body = checks(vec![Check::AnyOf {
            branches: vec![
                checks(vec![
                    Check::Properties {
                        properties: vec![PropertyRule {
                            name: "injected".into(),
                            node: Node::Accept,
                            default: Some(json!(1)),
                        }],
                    },
                    Check::Required {
                        names: vec!["missing".into()],
                    },
                ]),
                Node::Accept,
            ],
        }]);
        let runtime = link(body, Draft::Draft7);
        let mut value = json!({});
        runtime.run(&mut value).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn tuple_defaults_fill_contiguous_positions() {
        let body = checks(vec![Check::TupleItems {
            items: vec![
                TupleItem {
                    node: Node::Accept,
                    default: None,
                },
                TupleItem {
                    node: Node::Accept,
                    default: Some(json!("b")),
                },
                TupleItem {
                    node: Node::Accept,
                    default: Some(json!("c")),
                },
            ],
        }]);
        let runtime = link(body, Draft::Draft7);
        let mut value = json!(["a"]);
        runtime.run(&mut value).unwrap();
        assert_eq!(value, json!(["a", "b", "c"]));
        let mut empty = json!([]);
        runtime.run(&mut empty).unwrap();
        assert_eq!(empty, json!([]));
    }

    #[test]
    fn unknown_routine_fails_to_link() {
        let body = Node::Call {
            routine: "validate_missing".into(),
        };
        let err = Runtime::link(Draft::Draft7, [("validate", &body)], &[], "validate").unwrap_err();
        assert!(matches!(err, LinkError::UnknownRoutine(ref name) if name == "validate_missing"));
    }

    #[test]
    fn unknown_entry_point_fails_to_link() {
        let err = Runtime::link(Draft::Draft7, [("validate", &Node::Accept)], &[], "main").unwrap_err();
        assert!(matches!(err, LinkError::UnknownEntryPoint(_)));
    }

    #[test]
    fn pattern_index_out_of_range_fails_to_link() {
        let body = checks(vec![Check::Pattern { pattern: 3 }]);
        let err = Runtime::link(Draft::Draft7, [("validate", &body)], &[], "validate").unwrap_err();
        assert!(matches!(err, LinkError::UnknownPattern(3)));
    }
}
