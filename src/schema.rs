//! Schema declaration: the single source of truth for a configuration type.
//!
//! A [`Schema`] is an ordered list of [`FieldDescriptor`]s built from
//! [`Field`] declarations. Both the CLI surface and the resolution engine read
//! the same schema, so a field added here shows up as a switch, is accepted in
//! nested-config files, and is validated, with nothing else to wire.
//!
//! ```ignore
//! let model = Schema::builder("Model")
//!     .field(Field::int("depth").with_default(18))
//!     .field(Field::string("act").choices(["relu", "gelu"]))
//!     .build()?;
//!
//! let train = Schema::builder("Train")
//!     .field(Field::float("lr").bounded(Some(0.0), Some(1.0)).with_default(0.1))
//!     .field(Field::list("milestones", PrimitiveKind::Int).sequence([30, 60], Some(2)))
//!     .field(Field::bool("amp", false).with_help("use mixed precision"))
//!     .field(Field::int("epochs").required())
//!     .field(Field::nested("model", model))
//!     .build()?;
//! ```
//!
//! Building a schema resolves every field type once and runs the static
//! static declaration checks. Errors here are programmer mistakes, never
//! user input.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::RunfigError;
use crate::typing::{self, DeclaredType, EnumBinding, PrimitiveKind, ResolvedType};
use crate::validate;
use crate::value::Value;

/// Whether a field carries a default.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultState {
    NoDefault,
    Default(Value),
}

impl DefaultState {
    pub fn value(&self) -> Option<&Value> {
        match self {
            DefaultState::NoDefault => None,
            DefaultState::Default(v) => Some(v),
        }
    }
}

/// Inclusive numeric bounds. Missing ends are infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    lower: f64,
    upper: f64,
}

impl Bounds {
    pub fn new(lower: Option<f64>, upper: Option<f64>) -> Self {
        Self {
            lower: lower.unwrap_or(f64::NEG_INFINITY),
            upper: upper.unwrap_or(f64::INFINITY),
        }
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

/// Per-field constraint metadata, normalized to the field's resolved kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub choices: Option<Vec<Value>>,
    pub bounds: Option<Bounds>,
    pub size: Option<usize>,
    pub required: bool,
    pub help: Option<String>,
}

/// A field declaration. Consumed by [`SchemaBuilder::field`].
#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) declared: DeclaredType,
    pub(crate) default: DefaultState,
    pub(crate) choices: Option<Vec<Value>>,
    pub(crate) bounds: Option<Bounds>,
    pub(crate) size: Option<usize>,
    pub(crate) required: bool,
    pub(crate) help: Option<String>,
    pub(crate) metadata: BTreeMap<String, String>,
}

impl Field {
    pub fn new(name: &str, declared: DeclaredType) -> Self {
        Self {
            name: name.to_string(),
            declared,
            default: DefaultState::NoDefault,
            choices: None,
            bounds: None,
            size: None,
            required: false,
            help: None,
            metadata: BTreeMap::new(),
        }
    }

    /// A boolean toggle. The default decides what passing the switch does.
    pub fn bool(name: &str, default: bool) -> Self {
        Self::new(name, DeclaredType::Bool).with_default(default)
    }

    pub fn int(name: &str) -> Self {
        Self::new(name, DeclaredType::Int)
    }

    pub fn float(name: &str) -> Self {
        Self::new(name, DeclaredType::Float)
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, DeclaredType::Str)
    }

    pub fn list(name: &str, element: PrimitiveKind) -> Self {
        let element = match element {
            PrimitiveKind::Bool => DeclaredType::Bool,
            PrimitiveKind::Int => DeclaredType::Int,
            PrimitiveKind::Float => DeclaredType::Float,
            PrimitiveKind::Str => DeclaredType::Str,
        };
        Self::new(name, DeclaredType::list(element))
    }

    pub fn enumeration(name: &str, binding: EnumBinding) -> Self {
        Self::new(name, DeclaredType::Enum(binding))
    }

    /// A nested config. Its values come from the nested schema's defaults,
    /// an optional file passed as `--<name> <file>`, and `--<name>.<child>`.
    pub fn nested(name: &str, schema: Schema) -> Self {
        Self::new(name, DeclaredType::nested(schema))
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = DefaultState::Default(value.into());
        self
    }

    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Restrict the value to a fixed set. The first choice is the default
    /// unless one is set explicitly.
    pub fn choices<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// A container default. With `size`, exactly that many elements must be
    /// supplied.
    pub fn sequence<I, V>(mut self, values: I, size: Option<usize>) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.default = DefaultState::Default(Value::Seq(values.into_iter().map(Into::into).collect()));
        self.size = size;
        self
    }

    /// The value must be supplied on the command line (or, for nested
    /// fields, by the nested file).
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn bounded(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.bounds = Some(Bounds::new(lower, upper));
        self
    }

    /// Attach literal declaration metadata. The clap adapter honors
    /// `value_name` and `hide`.
    pub fn meta(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    fn describe(self) -> Result<FieldDescriptor, RunfigError> {
        let resolved = typing::resolve_type(&self.declared).map_err(|reason| {
            RunfigError::UnsupportedType {
                field: self.name.clone(),
                reason,
            }
        })?;

        if let ResolvedType::NestedSchema(inner) = &resolved
            && let Some(deep) = inner.fields().iter().find(|f| f.is_nested())
        {
            return Err(RunfigError::UnsupportedNesting {
                field: format!("{}.{}", self.name, deep.name()),
            });
        }

        let (default, constraints) = validate::check_declaration(&self, &resolved)?;

        Ok(FieldDescriptor {
            name: self.name,
            declared: self.declared,
            resolved,
            default,
            constraints,
            metadata: self.metadata,
        })
    }
}

/// A field as held by a built [`Schema`]. Immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    declared: DeclaredType,
    resolved: ResolvedType,
    default: DefaultState,
    constraints: Constraints,
    metadata: BTreeMap<String, String>,
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared(&self) -> &DeclaredType {
        &self.declared
    }

    pub fn resolved(&self) -> &ResolvedType {
        &self.resolved
    }

    pub fn default(&self) -> &DefaultState {
        &self.default
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn help(&self) -> Option<&str> {
        self.constraints.help.as_deref()
    }

    pub fn is_bool(&self) -> bool {
        self.declared.is_bool()
    }

    pub fn is_nested(&self) -> bool {
        matches!(self.resolved, ResolvedType::NestedSchema(_))
    }

    pub fn is_optional(&self) -> bool {
        self.declared.is_optional()
    }

    /// A leaf with nothing to fall back on: declared `required()`, or
    /// neither defaulted nor optional.
    pub fn is_required(&self) -> bool {
        if self.is_nested() {
            return false;
        }
        self.constraints.required
            || (self.default == DefaultState::NoDefault && !self.is_optional())
    }
}

/// A built configuration schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    pub fn builder(name: &str) -> SchemaBuilder {
        SchemaBuilder {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The nested schema behind field `name`, if that field is nested.
    pub fn nested(&self, name: &str) -> Option<&Schema> {
        match self.field(name)?.resolved() {
            ResolvedType::NestedSchema(schema) => Some(schema),
            _ => None,
        }
    }
}

pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Result<Schema, RunfigError> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.fields.len());
        for field in self.fields {
            if !seen.insert(field.name.clone()) {
                return Err(RunfigError::DuplicateField {
                    schema: self.name,
                    field: field.name,
                });
            }
            fields.push(field.describe()?);
        }
        Ok(Schema {
            name: self.name,
            fields,
        })
    }
}
