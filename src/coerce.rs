//! Turning raw inputs into typed [`Value`]s.
//!
//! Three entry points, one per input shape:
//!
//! - [`from_tokens`]: command-line tokens, always strings.
//! - [`from_mapped`]: values read from a nested-config file.
//! - [`conform`]: values written by the schema author (defaults, choices).
//!
//! Coercion only checks shape and kind. Bounds, choices and arity are
//! checked afterwards by the validation step.

use crate::error::RunfigError;
use crate::typing::{PrimitiveKind, ResolvedType};
use crate::validate;
use crate::value::Value;

/// Parse one token into a scalar of `kind`.
///
/// Booleans accept `true`/`false` in any case. Strings pass through.
pub fn parse_token(kind: PrimitiveKind, token: &str) -> Result<Value, String> {
    match kind {
        PrimitiveKind::Bool => {
            if token.eq_ignore_ascii_case("true") {
                Ok(Value::Bool(true))
            } else if token.eq_ignore_ascii_case("false") {
                Ok(Value::Bool(false))
            } else {
                Err(format!("expected true or false, got '{token}'"))
            }
        }
        PrimitiveKind::Int => token
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| format!("expected an integer, got '{token}'")),
        PrimitiveKind::Float => token
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("expected a number, got '{token}'")),
        PrimitiveKind::Str => Ok(Value::Str(token.to_string())),
    }
}

/// Coerce command-line tokens for the field at `key`.
///
/// Scalars take exactly one token. Containers take each token as an element;
/// their length is checked later against the declared size.
pub fn from_tokens(resolved: &ResolvedType, tokens: &[String], key: &str) -> Result<Value, RunfigError> {
    match resolved {
        ResolvedType::Primitive(kind) => {
            let [token] = tokens else {
                return Err(RunfigError::ArityMismatch {
                    key: key.to_string(),
                    expected: 1,
                    actual: tokens.len(),
                });
            };
            parse_token(*kind, token).map_err(|reason| invalid(key, reason))
        }
        ResolvedType::Enumeration(binding) => {
            let [token] = tokens else {
                return Err(RunfigError::ArityMismatch {
                    key: key.to_string(),
                    expected: 1,
                    actual: tokens.len(),
                });
            };
            validate::coerce_enum(binding, token, key)
        }
        ResolvedType::ContainerOf(kind) => tokens
            .iter()
            .map(|t| parse_token(*kind, t).map_err(|reason| invalid(key, reason)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Seq),
        ResolvedType::NestedSchema(_) => Err(invalid(
            key,
            "a nested config is set from a file or per-field switches".into(),
        )),
    }
}

/// Coerce a value read from a structured file.
///
/// Numeric kinds also accept numeric strings, since YAML authors quote
/// freely. `null` maps to [`Value::Absent`]; the caller decides whether that
/// falls back to the default.
pub fn from_mapped(
    resolved: &ResolvedType,
    raw: &serde_json::Value,
    key: &str,
) -> Result<Value, RunfigError> {
    if raw.is_null() {
        return Ok(Value::Absent);
    }
    match resolved {
        ResolvedType::Primitive(kind) => scalar_from_json(*kind, raw).map_err(|r| invalid(key, r)),
        ResolvedType::Enumeration(binding) => match raw.as_str() {
            Some(literal) => validate::coerce_enum(binding, literal, key),
            None => Err(invalid(key, format!("expected one of {}, got {raw}", binding.literals().join(", ")))),
        },
        ResolvedType::ContainerOf(kind) => match raw.as_array() {
            Some(items) => items
                .iter()
                .map(|item| scalar_from_json(*kind, item).map_err(|r| invalid(key, r)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Seq),
            None => Err(invalid(key, format!("expected a list of {kind}, got {raw}"))),
        },
        ResolvedType::NestedSchema(_) => Err(invalid(key, "nested configs cannot be nested again".into())),
    }
}

fn scalar_from_json(kind: PrimitiveKind, raw: &serde_json::Value) -> Result<Value, String> {
    use serde_json::Value as Json;

    match (kind, raw) {
        (PrimitiveKind::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
        (PrimitiveKind::Int, Json::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(Value::Int(i));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Value::Int(f as i64)),
                _ => Err(format!("expected an integer, got {n}")),
            }
        }
        (PrimitiveKind::Float, Json::Number(n)) => n
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| format!("expected a number, got {n}")),
        (PrimitiveKind::Int | PrimitiveKind::Float, Json::String(s)) => parse_token(kind, s),
        (PrimitiveKind::Str, Json::String(s)) => Ok(Value::Str(s.clone())),
        (PrimitiveKind::Str, Json::Number(n)) => Ok(Value::Str(n.to_string())),
        (PrimitiveKind::Str, Json::Bool(b)) => Ok(Value::Str(b.to_string())),
        (kind, other) => Err(format!("expected {kind}, got {other}")),
    }
}

/// Normalize an author-supplied value to the field's resolved kind.
///
/// Integers widen to floats and string literals become enumeration values.
/// Anything else that does not already match is rejected.
pub fn conform(resolved: &ResolvedType, value: Value) -> Result<Value, String> {
    match (resolved, value) {
        (_, Value::Absent) => Ok(Value::Absent),
        (ResolvedType::Primitive(kind), v) => conform_scalar(*kind, v),
        (ResolvedType::Enumeration(binding), Value::Str(s) | Value::Enum(s)) => {
            if binding.contains(&s) {
                Ok(Value::Enum(s))
            } else {
                Err(format!(
                    "'{s}' is not a literal of {} ({})",
                    binding.name(),
                    binding.literals().join(", ")
                ))
            }
        }
        (ResolvedType::ContainerOf(kind), Value::Seq(items)) => items
            .into_iter()
            .map(|item| conform_scalar(*kind, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Seq),
        (ResolvedType::ContainerOf(kind), other) => Err(format!("expected a list of {kind}, got {other}")),
        (ResolvedType::Enumeration(binding), other) => {
            Err(format!("expected a literal of {}, got {other}", binding.name()))
        }
        (ResolvedType::NestedSchema(_), other) => {
            Err(format!("nested configs take no literal value, got {other}"))
        }
    }
}

fn conform_scalar(kind: PrimitiveKind, value: Value) -> Result<Value, String> {
    match (kind, value) {
        (PrimitiveKind::Bool, v @ Value::Bool(_)) => Ok(v),
        (PrimitiveKind::Int, v @ Value::Int(_)) => Ok(v),
        (PrimitiveKind::Float, v @ Value::Float(_)) => Ok(v),
        (PrimitiveKind::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
        (PrimitiveKind::Str, v @ Value::Str(_)) => Ok(v),
        (PrimitiveKind::Str, Value::Enum(s)) => Ok(Value::Str(s)),
        (kind, other) => Err(format!("expected {kind}, got {other}")),
    }
}

fn invalid(key: &str, reason: String) -> RunfigError {
    RunfigError::InvalidValue {
        key: key.to_string(),
        reason,
    }
}
