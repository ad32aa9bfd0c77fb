//! Condition trees over resource attributes and properties.
//!
//! Paths are dotted property paths (`networkAcls.defaultAction`), with numeric
//! segments indexing arrays and `name[*]` expanding every array element. The
//! attribute names `type`, `name`, `id`, `sku` and `sku.name` address the node
//! itself; `type` matches the canonical type, the ARM type or the analyzer
//! label. String comparisons are case-insensitive.

use domain_architecture::ResourceNode;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    AllOf(Vec<Condition>),
    AnyOf(Vec<Condition>),
    Not(Box<Condition>),
    Field { path: String, test: FieldTest },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldTest {
    Equals(Value),
    NotEquals(Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    /// Glob with `*` and `?`
    Like(String),
    Exists(bool),
    GreaterOrEquals(f64),
    LessOrEquals(f64),
}

impl Condition {
    pub fn field(path: &str, test: FieldTest) -> Self {
        Condition::Field {
            path: path.to_string(),
            test,
        }
    }

    pub fn equals(path: &str, value: impl Into<Value>) -> Self {
        Self::field(path, FieldTest::Equals(value.into()))
    }

    pub fn not_equals(path: &str, value: impl Into<Value>) -> Self {
        Self::field(path, FieldTest::NotEquals(value.into()))
    }

    pub fn one_of<V: Into<Value>>(path: &str, values: impl IntoIterator<Item = V>) -> Self {
        Self::field(path, FieldTest::In(values.into_iter().map(Into::into).collect()))
    }

    pub fn exists(path: &str) -> Self {
        Self::field(path, FieldTest::Exists(true))
    }

    pub fn like(path: &str, pattern: &str) -> Self {
        Self::field(path, FieldTest::Like(pattern.to_string()))
    }

    pub fn at_least(path: &str, bound: f64) -> Self {
        Self::field(path, FieldTest::GreaterOrEquals(bound))
    }

    pub fn negate(condition: Condition) -> Self {
        Condition::Not(Box::new(condition))
    }

    /// Evaluate against one node. Errors name the offending path.
    pub fn evaluate(&self, node: &ResourceNode) -> Result<bool, String> {
        match self {
            Condition::AllOf(conditions) => {
                for condition in conditions {
                    if !condition.evaluate(node)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::AnyOf(conditions) => {
                for condition in conditions {
                    if condition.evaluate(node)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Condition::Not(condition) => condition.evaluate(node).map(|result| !result),
            Condition::Field { path, test } => test.evaluate(path, &resolve(node, path)),
        }
    }
}

impl FieldTest {
    fn evaluate(&self, path: &str, candidates: &[Value]) -> Result<bool, String> {
        let any = |wanted: &Value| candidates.iter().any(|value| values_match(value, wanted));
        Ok(match self {
            FieldTest::Equals(wanted) => any(wanted),
            FieldTest::NotEquals(wanted) => !any(wanted),
            FieldTest::In(options) => options.iter().any(any),
            FieldTest::NotIn(options) => !options.iter().any(any),
            FieldTest::Exists(expected) => !candidates.is_empty() == *expected,
            FieldTest::Like(pattern) => {
                let regex = glob_regex(pattern)
                    .map_err(|err| format!("invalid like pattern '{pattern}' for {path}: {err}"))?;
                candidates
                    .iter()
                    .filter_map(scalar_text)
                    .any(|text| regex.is_match(&text))
            }
            FieldTest::GreaterOrEquals(bound) => match numeric(path, candidates)? {
                Some(value) => value >= *bound,
                None => false,
            },
            FieldTest::LessOrEquals(bound) => match numeric(path, candidates)? {
                Some(value) => value <= *bound,
                None => false,
            },
        })
    }
}

/// Every value the path addresses on the node; empty when absent or null.
pub fn resolve(node: &ResourceNode, path: &str) -> Vec<Value> {
    let path = path.trim();
    let attribute = match path.to_ascii_lowercase().as_str() {
        "type" => {
            let mut values = vec![
                Value::String(node.canonical_type.to_string()),
                Value::String(node.raw_type.clone()),
            ];
            if let Some(arm) = node.canonical_type.arm_type() {
                values.push(Value::String(arm.to_string()));
            }
            Some(values)
        }
        "name" => Some(vec![Value::String(node.name.clone())]),
        "id" => Some(vec![Value::String(node.id.clone())]),
        "sku" | "sku.name" => Some(
            node.sku
                .iter()
                .map(|sku| Value::String(sku.clone()))
                .collect(),
        ),
        _ => None,
    };
    if let Some(values) = attribute {
        return values;
    }

    let path = path.strip_prefix("properties.").unwrap_or(path);
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    let Some((first, rest)) = segments.split_first() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let (key, expand) = split_wildcard(first);
    if let Some(root) = node.properties.get(key) {
        walk_expanded(root, expand, rest, &mut out);
    }
    out
}

fn split_wildcard(segment: &str) -> (&str, bool) {
    match segment.strip_suffix("[*]") {
        Some(key) => (key, true),
        None => (segment, false),
    }
}

fn walk_expanded(value: &Value, expand: bool, rest: &[&str], out: &mut Vec<Value>) {
    if expand {
        if let Value::Array(items) = value {
            for item in items {
                walk(item, rest, out);
            }
        }
    } else {
        walk(value, rest, out);
    }
}

fn walk(value: &Value, segments: &[&str], out: &mut Vec<Value>) {
    let Some((segment, rest)) = segments.split_first() else {
        if !value.is_null() {
            out.push(value.clone());
        }
        return;
    };
    let (key, expand) = split_wildcard(segment);
    let next = match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    };
    if let Some(next) = next {
        walk_expanded(next, expand, rest, out);
    }
}

fn values_match(actual: &Value, wanted: &Value) -> bool {
    match (actual, wanted) {
        (Value::String(a), Value::String(b)) => a.eq_ignore_ascii_case(b),
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(_), _) | (Value::Object(_), _) => actual == wanted,
        _ => match (scalar_text(actual), scalar_text(wanted)) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(&b),
            _ => false,
        },
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn numeric(path: &str, candidates: &[Value]) -> Result<Option<f64>, String> {
    let Some(value) = candidates.first() else {
        return Ok(None);
    };
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    number
        .map(Some)
        .ok_or_else(|| format!("{path} is not numeric ({value})"))
}

fn glob_regex(pattern: &str) -> Result<regex::Regex, regex::Error> {
    let mut expression = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => expression.push_str(".*"),
            '?' => expression.push('.'),
            other => expression.push_str(&regex::escape(&other.to_string())),
        }
    }
    expression.push('$');
    RegexBuilder::new(&expression).case_insensitive(true).build()
}
