//! The command-line surface a schema exposes, independent of any parser.
//!
//! [`build_surface`] walks a schema (and, one level down, its nested schemas)
//! and describes one [`Switch`] per leaf field plus one file-path switch per
//! nested field. The clap adapter renders these into a `clap::Command`;
//! another parser could render them just as well.
//!
//! | field                       | switch                     |
//! |-----------------------------|----------------------------|
//! | `bool`, default `d`         | bare toggle, sets `!d`     |
//! | scalar                      | one value                  |
//! | scalar with choices / enum  | one value from a fixed set |
//! | list                        | one or more values         |
//! | nested schema               | one `FILE` value           |

use crate::error::RunfigError;
use crate::namespace;
use crate::schema::{Bounds, DefaultState, FieldDescriptor, Schema};
use crate::typing::{PrimitiveKind, ResolvedType};
use crate::value::Value;

/// How a switch consumes tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum SwitchShape {
    /// No value. Passing the switch sets the field to `sets`.
    Toggle { sets: bool },
    /// A single token of `kind`. Bounds are checked while parsing.
    Value { kind: PrimitiveKind, bounds: Option<Bounds> },
    /// One or more tokens of `kind`.
    Multi {
        kind: PrimitiveKind,
        bounds: Option<Bounds>,
        size: Option<usize>,
    },
    /// A single token out of a closed set.
    Choice { literals: Vec<String> },
    /// A path to a nested-config file.
    FilePath,
}

/// One registered switch, named `--<name>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    /// Qualified name: `field` or `parent.field`.
    pub name: String,
    pub shape: SwitchShape,
    /// Token form of the field default. Empty when there is none.
    pub default_tokens: Vec<String>,
    /// The switch must appear on the command line.
    pub required: bool,
    pub help: String,
    pub value_name: Option<String>,
    pub hidden: bool,
}

/// Every switch a schema registers, in declaration order (a nested field's
/// file switch comes right before its children).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Surface {
    switches: Vec<Switch>,
}

impl Surface {
    pub fn switches(&self) -> &[Switch] {
        &self.switches
    }

    pub fn switch(&self, name: &str) -> Option<&Switch> {
        self.switches.iter().find(|s| s.name == name)
    }
}

pub fn build_surface(schema: &Schema) -> Result<Surface, RunfigError> {
    let mut surface = Surface::default();
    register(schema, None, 0, &mut surface)?;
    Ok(surface)
}

fn register(
    schema: &Schema,
    prefix: Option<&str>,
    depth: usize,
    surface: &mut Surface,
) -> Result<(), RunfigError> {
    for field in schema.fields() {
        let name = namespace::qualify(prefix, field.name());

        if let ResolvedType::NestedSchema(inner) = field.resolved() {
            if depth > 0 {
                return Err(RunfigError::UnsupportedNesting { field: name });
            }
            surface.switches.push(Switch {
                shape: SwitchShape::FilePath,
                default_tokens: Vec::new(),
                required: false,
                help: field.help().map(str::to_string).unwrap_or_else(|| {
                    format!("load {{yaml,yml,json}} file for {}", inner.name())
                }),
                value_name: Some("FILE".to_string()),
                hidden: is_hidden(field),
                name: name.clone(),
            });
            register(inner, Some(&name), depth + 1, surface)?;
            continue;
        }

        surface.switches.push(leaf_switch(field, name, depth));
    }
    Ok(())
}

fn leaf_switch(field: &FieldDescriptor, name: String, depth: usize) -> Switch {
    let constraints = field.constraints();
    let default = field.default().value();

    let shape = match (field.resolved(), default) {
        (ResolvedType::Primitive(PrimitiveKind::Bool), Some(Value::Bool(d))) if field.is_bool() => {
            SwitchShape::Toggle { sets: !d }
        }
        (ResolvedType::Enumeration(binding), _) => SwitchShape::Choice {
            literals: binding.literals().to_vec(),
        },
        (ResolvedType::Primitive(PrimitiveKind::Str), _) if constraints.choices.is_some() => {
            SwitchShape::Choice {
                literals: constraints
                    .choices
                    .iter()
                    .flatten()
                    .filter_map(Value::to_token)
                    .collect(),
            }
        }
        (ResolvedType::ContainerOf(kind), _) => SwitchShape::Multi {
            kind: *kind,
            bounds: constraints.bounds,
            size: constraints.size,
        },
        (ResolvedType::Primitive(kind), _) => SwitchShape::Value {
            kind: *kind,
            bounds: constraints.bounds,
        },
        (ResolvedType::NestedSchema(_), _) => SwitchShape::FilePath,
    };

    let default_tokens = match default {
        Some(Value::Seq(items)) => items.iter().filter_map(Value::to_token).collect(),
        Some(scalar) => scalar.to_token().into_iter().collect(),
        None => Vec::new(),
    };

    // Nested leaves are never mandatory here: the nested file may supply them.
    let required = depth == 0 && field.is_required();

    let mut help = field.help().unwrap_or_default().to_string();
    if required {
        if !help.is_empty() {
            help.push(' ');
        }
        help.push_str("(required)");
    } else if let (SwitchShape::Toggle { .. }, DefaultState::Default(d)) = (&shape, field.default()) {
        if !help.is_empty() {
            help.push(' ');
        }
        help.push_str(&format!("(default: {d})"));
    }

    // Numeric choices are compared by value in the engine, not by spelling.
    if let (SwitchShape::Value { .. }, Some(choices)) = (&shape, &constraints.choices) {
        let listed: Vec<String> = choices.iter().filter_map(Value::to_token).collect();
        if !help.is_empty() {
            help.push(' ');
        }
        help.push_str(&format!("(one of: {})", listed.join(", ")));
    }

    Switch {
        name,
        shape,
        default_tokens,
        required,
        help,
        value_name: field.metadata().get("value_name").cloned(),
        hidden: is_hidden(field),
    }
}

fn is_hidden(field: &FieldDescriptor) -> bool {
    field
        .metadata()
        .get("hide")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}
