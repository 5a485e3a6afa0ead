//! Core resolution pipeline: turn a parsed namespace into a validated [`Config`].
//!
//! Operates on a [`ResolveInput`] plus a [`MappingLoader`]; the loader is the
//! only way the engine reaches outside memory, so the whole pipeline is
//! testable with synthetic namespaces and in-memory files. Steps:
//!
//! 1. Partition the namespace into root leaves, nested-file paths and
//!    `parent.child` overrides (unknown names are set aside as unconsumed)
//! 2. For each nested field with a file path, load the mapping and seed the
//!    nested merge state with it (`FromFile`)
//! 3. Offer every command-line entry to its merge state under its own
//!    provenance, so untouched defaults lose to file values and explicit
//!    values win over both
//! 4. Settle each leaf: coerce the winner, fall back to the default, or fail
//!    if the field is required
//! 5. Validate each settled leaf against its constraints
//!
//! [`from_mapping`] is the programmatic counterpart: one mapping in, one
//! config out, with no command line involved.

use std::path::PathBuf;

use indexmap::IndexMap;

use crate::coerce;
use crate::error::RunfigError;
use crate::file::MappingLoader;
use crate::merge::{Incoming, MergeState};
use crate::namespace::{self, Namespace, Partitioned, RawEntry};
use crate::schema::{DefaultState, FieldDescriptor, Schema};
use crate::typing::ResolvedType;
use crate::validate;
use crate::value::{Config, Mapping, Value};

/// Everything the engine needs besides the schema.
pub struct ResolveInput {
    pub namespace: Namespace,
    /// Reject keys in nested-config files that the nested schema does not
    /// declare. When off, they are logged and dropped.
    pub strict: bool,
}

/// A resolved config plus the command-line tokens nothing claimed.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub config: Config,
    pub unconsumed: Vec<String>,
}

pub fn resolve(
    schema: &Schema,
    input: ResolveInput,
    loader: &dyn MappingLoader,
) -> Result<Resolved, RunfigError> {
    let Partitioned {
        leaves,
        mut files,
        mut children,
        unconsumed,
    } = namespace::partition(schema, input.namespace);

    let mut root = MergeState::new();
    for (key, entry) in leaves {
        root.apply_cli(&key, entry);
    }

    let mut values = IndexMap::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let name = field.name();
        let value = match field.resolved() {
            ResolvedType::NestedSchema(inner) => {
                let nested = resolve_nested(
                    name,
                    inner,
                    files.shift_remove(name),
                    children.shift_remove(name).unwrap_or_default(),
                    input.strict,
                    loader,
                )?;
                Value::Nested(nested)
            }
            _ => settle(field, root.take(name), name, false)?,
        };
        values.insert(name.to_string(), value);
    }

    Ok(Resolved {
        config: Config::new(schema.name(), values),
        unconsumed,
    })
}

fn resolve_nested(
    name: &str,
    schema: &Schema,
    file: Option<RawEntry>,
    overrides: IndexMap<String, RawEntry>,
    strict: bool,
    loader: &dyn MappingLoader,
) -> Result<Config, RunfigError> {
    let mut state = MergeState::new();

    if let Some(entry) = file {
        let [path] = entry.tokens.as_slice() else {
            return Err(RunfigError::ArityMismatch {
                key: name.to_string(),
                expected: 1,
                actual: entry.tokens.len(),
            });
        };
        let path = PathBuf::from(path);
        let mut mapping = loader.load(&path)?;

        let unknown = validate::unknown_keys(schema, &mapping);
        if !unknown.is_empty() {
            if strict {
                let errors = unknown
                    .into_iter()
                    .map(|key| RunfigError::UnknownKey {
                        key,
                        path: path.clone(),
                    })
                    .collect();
                return Err(RunfigError::UnknownKeys(errors));
            }
            tracing::warn!(
                path = %path.display(),
                keys = %unknown.join(", "),
                "ignoring keys not declared by {}",
                schema.name()
            );
            for key in &unknown {
                mapping.remove(key);
            }
        }

        state.seed_from_file(mapping);
    }

    for (child, entry) in overrides {
        state.apply_cli(&child, entry);
    }

    let mut values = IndexMap::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let key = namespace::qualify(Some(name), field.name());
        let value = settle(field, state.take(field.name()), &key, false)?;
        values.insert(field.name().to_string(), value);
    }
    Ok(Config::new(schema.name(), values))
}

/// Pick the final value of one leaf and validate it.
///
/// A supplied value wins; otherwise the default; otherwise [`Value::Absent`]
/// when the field may be missing, else [`RunfigError::MissingRequiredValue`]
/// naming the qualified `key`.
fn settle(
    field: &FieldDescriptor,
    incoming: Option<Incoming>,
    key: &str,
    allow_missing: bool,
) -> Result<Value, RunfigError> {
    let supplied = match incoming {
        Some(Incoming::Tokens(tokens)) => Some(coerce::from_tokens(field.resolved(), &tokens, key)?),
        Some(Incoming::Mapped(raw)) => match coerce::from_mapped(field.resolved(), &raw, key)? {
            Value::Absent => None,
            value => Some(value),
        },
        None => None,
    };

    let value = match (supplied, field.default()) {
        (Some(value), _) => value,
        (None, DefaultState::Default(default)) => default.clone(),
        (None, DefaultState::NoDefault) => {
            if field.is_required() && !allow_missing {
                return Err(RunfigError::MissingRequiredValue(key.to_string()));
            }
            Value::Absent
        }
    };

    validate::check_value(field, &value, key)?;
    Ok(value)
}

/// Build a config straight from a mapping, as produced by
/// [`Config::to_mapping`] or read from a file.
///
/// Missing keys fall back to defaults. With `allow_missing`, a field with
/// neither a value nor a default resolves to [`Value::Absent`] instead of
/// failing. Keys the schema does not declare are ignored.
pub fn from_mapping(
    schema: &Schema,
    mapping: &Mapping,
    allow_missing: bool,
) -> Result<Config, RunfigError> {
    from_mapping_at(schema, mapping, None, allow_missing)
}

fn from_mapping_at(
    schema: &Schema,
    mapping: &Mapping,
    prefix: Option<&str>,
    allow_missing: bool,
) -> Result<Config, RunfigError> {
    let mut values = IndexMap::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let key = namespace::qualify(prefix, field.name());
        let raw = mapping.get(field.name());
        let value = match field.resolved() {
            ResolvedType::NestedSchema(inner) => {
                let empty = Mapping::new();
                let nested = match raw {
                    Some(serde_json::Value::Object(m)) => m,
                    None | Some(serde_json::Value::Null) => &empty,
                    Some(other) => {
                        return Err(RunfigError::InvalidValue {
                            key,
                            reason: format!("expected a mapping for {}, got {other}", inner.name()),
                        });
                    }
                };
                Value::Nested(from_mapping_at(inner, nested, Some(&key), allow_missing)?)
            }
            _ => settle(field, raw.cloned().map(Incoming::Mapped), &key, allow_missing)?,
        };
        values.insert(field.name().to_string(), value);
    }
    Ok(Config::new(schema.name(), values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{
        MemoryLoader, bounded_schema, enum_schema, nested_schema, required_schema, simple_schema,
    };
    use serde_json::json;

    fn run(schema: &Schema, ns: Namespace) -> Result<Resolved, RunfigError> {
        run_with(schema, ns, &MemoryLoader::default(), true)
    }

    fn run_with(
        schema: &Schema,
        ns: Namespace,
        loader: &MemoryLoader,
        strict: bool,
    ) -> Result<Resolved, RunfigError> {
        resolve(
            schema,
            ResolveInput {
                namespace: ns,
                strict,
            },
            loader,
        )
    }

    // --- required ---

    #[test]
    fn required_field_missing_names_it() {
        match run(&simple_schema(), Namespace::new()) {
            Err(RunfigError::MissingRequiredValue(key)) => assert_eq!(key, "a"),
            other => panic!("Expected MissingRequiredValue, got {other:?}"),
        }
    }

    #[test]
    fn required_field_supplied() {
        let resolved = run(&simple_schema(), Namespace::new().explicit("a", ["1"])).unwrap();
        let config = resolved.config;
        assert_eq!(config.get("a"), Some(&Value::Int(1)));
        assert_eq!(config.get("b"), Some(&Value::Int(2)));
        assert_eq!(config.get("c"), Some(&Value::Bool(false)));
        assert_eq!(config.get("d"), Some(&Value::Bool(true)));
        assert_eq!(config.get("e"), Some(&Value::Str("test".into())));
    }

    #[test]
    fn nested_required_field_names_qualified_path() {
        let ns = Namespace::new().explicit("a", ["1"]);
        match run(&required_schema(), ns) {
            Err(RunfigError::MissingRequiredValue(key)) => assert_eq!(key, "inner.x"),
            other => panic!("Expected MissingRequiredValue, got {other:?}"),
        }
    }

    #[test]
    fn nested_required_field_from_file() {
        let loader = MemoryLoader::default().with("inner.json", json!({"x": 7}));
        let ns = Namespace::new()
            .explicit("a", ["1"])
            .explicit("inner", ["inner.json"])
            .untouched("inner.y", ["y"]);
        let config = run_with(&required_schema(), ns, &loader, true).unwrap().config;
        assert_eq!(config.get("inner.x"), Some(&Value::Int(7)));
        assert_eq!(config.get("inner.y"), Some(&Value::Str("y".into())));
    }

    // --- precedence ---

    fn nested_ns() -> Namespace {
        Namespace::new().explicit("a", ["3.2"]).untouched("b.c", ["1"])
    }

    fn c_file() -> MemoryLoader {
        MemoryLoader::default().with("c.json", json!({"c": 5}))
    }

    #[test]
    fn precedence_default_only() {
        let config = run(&nested_schema(), nested_ns()).unwrap().config;
        assert_eq!(config.get("a"), Some(&Value::Float(3.2)));
        assert_eq!(config.get("b.c"), Some(&Value::Int(1)));
        assert_eq!(config.get("b").and_then(Value::as_config).map(Config::name), Some("A"));
    }

    #[test]
    fn precedence_file_beats_untouched_default() {
        let ns = nested_ns().explicit("b", ["c.json"]);
        let config = run_with(&nested_schema(), ns, &c_file(), true).unwrap().config;
        assert_eq!(config.get("b.c"), Some(&Value::Int(5)));
    }

    #[test]
    fn precedence_explicit_beats_file() {
        let ns = nested_ns().explicit("b", ["c.json"]).explicit("b.c", ["9"]);
        let config = run_with(&nested_schema(), ns, &c_file(), true).unwrap().config;
        assert_eq!(config.get("b.c"), Some(&Value::Int(9)));
    }

    #[test]
    fn precedence_explicit_equal_to_default_still_beats_file() {
        let ns = nested_ns().explicit("b", ["c.json"]).explicit("b.c", ["1"]);
        let config = run_with(&nested_schema(), ns, &c_file(), true).unwrap().config;
        assert_eq!(config.get("b.c"), Some(&Value::Int(1)));
    }

    #[test]
    fn nested_defaults_without_any_entry() {
        let ns = Namespace::new().explicit("a", ["3.2"]);
        let config = run(&nested_schema(), ns).unwrap().config;
        assert_eq!(config.get("b.c"), Some(&Value::Int(1)));
    }

    // --- files ---

    #[test]
    fn strict_rejects_unknown_file_key() {
        let loader = MemoryLoader::default().with("c.json", json!({"c": 5, "typo": 1}));
        let ns = nested_ns().explicit("b", ["c.json"]);
        match run_with(&nested_schema(), ns, &loader, true) {
            Err(RunfigError::UnknownKeys(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(matches!(&errors[0], RunfigError::UnknownKey { key, .. } if key == "typo"));
            }
            other => panic!("Expected UnknownKeys, got {other:?}"),
        }
    }

    #[test]
    fn lenient_ignores_unknown_file_key() {
        let loader = MemoryLoader::default().with("c.json", json!({"c": 5, "typo": 1}));
        let ns = nested_ns().explicit("b", ["c.json"]);
        let config = run_with(&nested_schema(), ns, &loader, false).unwrap().config;
        assert_eq!(config.get("b.c"), Some(&Value::Int(5)));
    }

    #[test]
    fn unsupported_file_type() {
        let ns = nested_ns().explicit("b", ["c.toml"]);
        assert!(matches!(
            run(&nested_schema(), ns),
            Err(RunfigError::UnsupportedFileType { .. })
        ));
    }

    #[test]
    fn missing_file() {
        let ns = nested_ns().explicit("b", ["missing.yaml"]);
        assert!(matches!(
            run(&nested_schema(), ns),
            Err(RunfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn file_value_of_wrong_kind() {
        let loader = MemoryLoader::default().with("c.json", json!({"c": "five"}));
        let ns = nested_ns().explicit("b", ["c.json"]);
        match run_with(&nested_schema(), ns, &loader, true) {
            Err(RunfigError::InvalidValue { key, .. }) => assert_eq!(key, "b.c"),
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    // --- constraints ---

    #[test]
    fn bound_violation_fails() {
        let ns = Namespace::new().explicit("lr", ["2.1"]);
        assert!(matches!(
            run(&bounded_schema(), ns),
            Err(RunfigError::OutOfRange { .. })
        ));
    }

    #[test]
    fn bound_edges_pass() {
        for edge in ["-1", "2"] {
            let ns = Namespace::new().explicit("lr", [edge]);
            assert!(run(&bounded_schema(), ns).is_ok(), "{edge}");
        }
    }

    #[test]
    fn fixed_size_sequence_arity() {
        let short = Namespace::new().explicit("xs", ["4", "5"]);
        assert!(matches!(
            run(&bounded_schema(), short),
            Err(RunfigError::ArityMismatch { expected: 3, actual: 2, .. })
        ));

        let exact = Namespace::new().explicit("xs", ["4", "5", "6"]);
        let config = run(&bounded_schema(), exact).unwrap().config;
        assert_eq!(
            config.get("xs"),
            Some(&Value::Seq(vec![Value::Int(4), Value::Int(5), Value::Int(6)]))
        );
    }

    #[test]
    fn enum_token_outside_set() {
        let ns = Namespace::new().explicit("act", ["tanh"]);
        assert!(matches!(
            run(&enum_schema(), ns),
            Err(RunfigError::InvalidChoice { .. })
        ));
    }

    #[test]
    fn optional_without_default_is_absent() {
        let config = run(&enum_schema(), Namespace::new()).unwrap().config;
        assert_eq!(config.get("act"), Some(&Value::Enum("relu".into())));
        assert_eq!(config.get("dropout"), Some(&Value::Absent));
    }

    // --- unconsumed ---

    #[test]
    fn unknown_names_are_returned_not_rejected() {
        let ns = Namespace::new()
            .explicit("a", ["1"])
            .explicit("nope", ["x"])
            .with_unconsumed(["--", "rest"]);
        let resolved = run(&simple_schema(), ns).unwrap();
        assert_eq!(resolved.unconsumed, vec!["--", "rest", "--nope", "x"]);
    }

    // --- programmatic surface ---

    #[test]
    fn mapping_round_trip() {
        let ns = nested_ns().explicit("b", ["c.json"]);
        let config = run_with(&nested_schema(), ns, &c_file(), true).unwrap().config;
        let back = from_mapping(&nested_schema(), &config.to_mapping(), false).unwrap();
        assert_eq!(back, config);

        let config = run(&enum_schema(), Namespace::new().explicit("act", ["gelu"]))
            .unwrap()
            .config;
        let back = from_mapping(&enum_schema(), &config.to_mapping(), false).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn from_mapping_fills_defaults() {
        let mapping = json!({"a": 3.2}).as_object().unwrap().clone();
        let config = from_mapping(&nested_schema(), &mapping, false).unwrap();
        assert_eq!(config.get("b.c"), Some(&Value::Int(1)));
    }

    #[test]
    fn from_mapping_allow_missing() {
        let empty = Mapping::new();
        assert!(matches!(
            from_mapping(&simple_schema(), &empty, false),
            Err(RunfigError::MissingRequiredValue(_))
        ));
        let config = from_mapping(&simple_schema(), &empty, true).unwrap();
        assert_eq!(config.get("a"), Some(&Value::Absent));
        assert_eq!(config.get("b"), Some(&Value::Int(2)));
    }

    #[test]
    fn from_mapping_validates() {
        let mapping = json!({"lr": 5.0}).as_object().unwrap().clone();
        assert!(matches!(
            from_mapping(&bounded_schema(), &mapping, false),
            Err(RunfigError::OutOfRange { .. })
        ));
    }
}
