//! Resolved values and the [`Config`] they live in.

use std::fmt;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::error::RunfigError;

/// A structured-file mapping: string keys to JSON-like values, order preserved.
pub type Mapping = serde_json::Map<String, serde_json::Value>;

/// A single resolved field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value was supplied and the field has no default.
    Absent,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// An enumeration literal.
    Enum(String),
    Seq(Vec<Value>),
    Nested(Config),
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Strings and enumeration literals.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_config(&self) -> Option<&Config> {
        match self {
            Value::Nested(c) => Some(c),
            _ => None,
        }
    }

    /// Render as a JSON value. Enumerations serialize to their literal,
    /// nested configs recursively, absent values to `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Absent => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) | Value::Enum(s) => serde_json::Value::String(s.clone()),
            Value::Seq(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Nested(config) => serde_json::Value::Object(config.to_mapping()),
        }
    }

    /// The CLI token form of a scalar. Used for switch defaults.
    pub(crate) fn to_token(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Str(s) | Value::Enum(s) => Some(s.clone()),
            Value::Absent | Value::Seq(_) | Value::Nested(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => f.write_str("<not set>"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) | Value::Enum(s) => f.write_str(s),
            Value::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Nested(config) => write!(f, "{{{}}}", config.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(v: Vec<V>) -> Self {
        Value::Seq(v.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(v: Option<V>) -> Self {
        v.map(Into::into).unwrap_or(Value::Absent)
    }
}

/// A fully resolved, validated configuration.
///
/// Field values appear in schema declaration order. Nested configs are held
/// as [`Value::Nested`]. A `Config` is immutable once the engine returns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    name: String,
    values: IndexMap<String, Value>,
}

impl Config {
    pub(crate) fn new(name: &str, values: IndexMap<String, Value>) -> Self {
        Self {
            name: name.to_string(),
            values,
        }
    }

    /// The schema name this config was built from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a value by field name or dotted path (`"model.depth"`).
    pub fn get(&self, key: &str) -> Option<&Value> {
        match key.split_once('.') {
            Some((parent, rest)) => self.values.get(parent)?.as_config()?.get(rest),
            None => self.values.get(key),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All leaf values as dotted key pairs, in declaration order.
    pub fn flatten(&self) -> Vec<(String, &Value)> {
        let mut out = Vec::new();
        self.collect_leaves("", &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a Value)>) {
        for (key, value) in &self.values {
            let dotted = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            match value {
                Value::Nested(inner) => inner.collect_leaves(&dotted, out),
                leaf => out.push((dotted, leaf)),
            }
        }
    }

    pub fn to_mapping(&self) -> Mapping {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }

    /// Deserialize into a strongly typed struct.
    ///
    /// Every config key must be consumed by `T`; keys the target type ignores
    /// are reported as [`RunfigError::TypeMismatch`] so the struct and the
    /// schema cannot silently drift apart.
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T, RunfigError> {
        let type_name = std::any::type_name::<T>();
        let mut ignored = Vec::new();
        let value = serde_json::Value::Object(self.to_mapping());
        let typed: T = serde_ignored::deserialize(value, |path| ignored.push(path.to_string()))
            .map_err(|e| RunfigError::TypeMismatch {
                type_name,
                reason: e.to_string(),
            })?;
        if !ignored.is_empty() {
            return Err(RunfigError::TypeMismatch {
                type_name,
                reason: format!("keys not consumed: {}", ignored.join(", ")),
            });
        }
        Ok(typed)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.flatten().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{key} = {value}")?;
        }
        Ok(())
    }
}
