//! Value and declaration checks.
//!
//! Runtime checks ([`check_value`]) run on every settled leaf, whichever
//! source it came from. Declaration checks ([`check_declaration`]) run once
//! when a schema is built and reject fields whose own defaults could never
//! pass the runtime checks.

use crate::coerce;
use crate::error::RunfigError;
use crate::schema::{Constraints, DefaultState, Field, FieldDescriptor, Schema};
use crate::typing::{EnumBinding, ResolvedType};
use crate::value::{Mapping, Value};

/// Check a settled value against the field's constraints.
pub fn check_value(field: &FieldDescriptor, value: &Value, key: &str) -> Result<(), RunfigError> {
    check_constraints(field.constraints(), value, key)
}

/// Arity first, then bounds (elementwise for sequences), then choices.
/// Absent values pass.
pub fn check_constraints(
    constraints: &Constraints,
    value: &Value,
    key: &str,
) -> Result<(), RunfigError> {
    if value.is_absent() {
        return Ok(());
    }

    if let (Some(size), Value::Seq(items)) = (constraints.size, value)
        && items.len() != size
    {
        return Err(RunfigError::ArityMismatch {
            key: key.to_string(),
            expected: size,
            actual: items.len(),
        });
    }

    if let Some(bounds) = constraints.bounds {
        let numbers: Vec<f64> = match value {
            Value::Seq(items) => items.iter().filter_map(Value::as_f64).collect(),
            scalar => scalar.as_f64().into_iter().collect(),
        };
        if let Some(outside) = numbers.into_iter().find(|n| !bounds.contains(*n)) {
            return Err(RunfigError::OutOfRange {
                key: key.to_string(),
                value: outside,
                lower: bounds.lower(),
                upper: bounds.upper(),
            });
        }
    }

    if let Some(choices) = &constraints.choices
        && !choices.contains(value)
    {
        return Err(RunfigError::InvalidChoice {
            key: key.to_string(),
            value: value.to_string(),
            choices: choices.iter().map(Value::to_string).collect(),
        });
    }

    Ok(())
}

/// Bind a literal to an enumeration.
pub fn coerce_enum(binding: &EnumBinding, literal: &str, key: &str) -> Result<Value, RunfigError> {
    if binding.contains(literal) {
        Ok(Value::Enum(literal.to_string()))
    } else {
        Err(RunfigError::InvalidChoice {
            key: key.to_string(),
            value: literal.to_string(),
            choices: binding.literals().to_vec(),
        })
    }
}

/// Keys of a loaded mapping the schema does not declare, in file order.
pub fn unknown_keys(schema: &Schema, mapping: &Mapping) -> Vec<String> {
    mapping
        .keys()
        .filter(|key| schema.field(key).is_none())
        .cloned()
        .collect()
}

/// Static checks on a single field declaration.
///
/// Returns the normalized default and constraints. A default supplied as an
/// integer for a float field comes back widened, a string default for an
/// enumeration comes back bound, and a field with choices but no default
/// takes the first choice.
pub(crate) fn check_declaration(
    field: &Field,
    resolved: &ResolvedType,
) -> Result<(DefaultState, Constraints), RunfigError> {
    let invalid = |reason: String| RunfigError::InvalidDeclaration {
        field: field.name.clone(),
        reason,
    };

    if field.name.is_empty() || field.name.contains('.') || field.name.starts_with('-') {
        return Err(invalid("names must be non-empty, undotted and not start with '-'".into()));
    }
    if field.name == "help" {
        return Err(invalid("'help' is reserved for the help switch".into()));
    }

    if let ResolvedType::NestedSchema(_) = resolved {
        if field.default != DefaultState::NoDefault {
            return Err(invalid("nested fields take their defaults from the nested schema".into()));
        }
        if field.choices.is_some() || field.bounds.is_some() || field.size.is_some() || field.required {
            return Err(invalid("nested fields take no constraints".into()));
        }
        let constraints = Constraints {
            help: field.help.clone(),
            ..Constraints::default()
        };
        return Ok((DefaultState::NoDefault, constraints));
    }

    let mut default = match &field.default {
        DefaultState::NoDefault => DefaultState::NoDefault,
        DefaultState::Default(value) => {
            let value = coerce::conform(resolved, value.clone())
                .map_err(|reason| invalid(format!("default: {reason}")))?;
            if value.is_absent() && !field.declared.is_optional() {
                return Err(invalid("only optional fields may default to nothing".into()));
            }
            DefaultState::Default(value)
        }
    };

    let choices = match &field.choices {
        None => None,
        Some(values) => {
            if !matches!(resolved, ResolvedType::Primitive(_) | ResolvedType::Enumeration(_)) {
                return Err(invalid("choices apply to scalar fields only".into()));
            }
            let conformed = values
                .iter()
                .map(|v| coerce::conform(resolved, v.clone()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|reason| invalid(format!("choice: {reason}")))?;
            if conformed.is_empty() {
                return Err(invalid("choices must not be empty".into()));
            }
            if default == DefaultState::NoDefault && !field.required {
                default = DefaultState::Default(conformed[0].clone());
            }
            Some(conformed)
        }
    };

    if field.declared.is_bool() && !matches!(default, DefaultState::Default(Value::Bool(_))) {
        return Err(invalid("boolean fields need a default, the switch toggles it".into()));
    }
    if field.required && default != DefaultState::NoDefault {
        return Err(invalid("required fields cannot have a default".into()));
    }

    if let Some(bounds) = field.bounds {
        if !resolved.is_numeric() {
            return Err(invalid("bounds apply to int and float fields only".into()));
        }
        if bounds.lower() > bounds.upper() {
            return Err(invalid(format!("empty range {bounds}")));
        }
    }

    if field.size.is_some() && !matches!(resolved, ResolvedType::ContainerOf(_)) {
        return Err(invalid("a fixed size applies to list fields only".into()));
    }

    let constraints = Constraints {
        choices,
        bounds: field.bounds,
        size: field.size,
        required: field.required,
        help: field.help.clone(),
    };

    if let DefaultState::Default(value) = &default {
        check_constraints(&constraints, value, &field.name)
            .map_err(|e| invalid(format!("default does not pass its own constraints: {e}")))?;
    }

    Ok((default, constraints))
}
