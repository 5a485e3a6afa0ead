//! Field types: what a field declares and what it resolves to.
//!
//! A [`DeclaredType`] is written by the schema author and may carry wrappers
//! (`Optional`, single-member `Union`). [`resolve_type`] normalizes it into
//! one of the four [`ResolvedType`] shapes the surface builder and the
//! resolution engine understand. Resolution happens once, when the schema is
//! built.

use std::fmt;
use std::sync::Arc;

use crate::schema::Schema;

/// Scalar kinds a leaf or a container element can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Bool,
    Int,
    Float,
    Str,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Str => "string",
        };
        f.write_str(name)
    }
}

/// A closed set of accepted literals.
///
/// Coercing a token outside the set fails with
/// [`InvalidChoice`](crate::RunfigError::InvalidChoice).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumBinding {
    name: String,
    literals: Vec<String>,
}

impl EnumBinding {
    pub fn new<I, S>(name: &str, literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            literals: literals.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn literals(&self) -> &[String] {
        &self.literals
    }

    pub fn contains(&self, literal: &str) -> bool {
        self.literals.iter().any(|l| l == literal)
    }
}

/// The type a field is declared with.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclaredType {
    Bool,
    Int,
    Float,
    Str,
    Enum(EnumBinding),
    List(Box<DeclaredType>),
    Optional(Box<DeclaredType>),
    Union(Vec<DeclaredType>),
    Nested(Arc<Schema>),
}

impl DeclaredType {
    pub fn list(element: DeclaredType) -> Self {
        DeclaredType::List(Box::new(element))
    }

    pub fn optional(inner: DeclaredType) -> Self {
        DeclaredType::Optional(Box::new(inner))
    }

    pub fn nested(schema: Schema) -> Self {
        DeclaredType::Nested(Arc::new(schema))
    }

    /// Booleans are detected ahead of generic resolution: their CLI shape is
    /// a toggle, not a value switch.
    pub fn is_bool(&self) -> bool {
        match self {
            DeclaredType::Bool => true,
            DeclaredType::Optional(inner) => **inner == DeclaredType::Bool,
            _ => false,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, DeclaredType::Optional(_))
    }

    fn primitive(&self) -> Option<PrimitiveKind> {
        match self {
            DeclaredType::Bool => Some(PrimitiveKind::Bool),
            DeclaredType::Int => Some(PrimitiveKind::Int),
            DeclaredType::Float => Some(PrimitiveKind::Float),
            DeclaredType::Str => Some(PrimitiveKind::Str),
            _ => None,
        }
    }
}

/// A declared type with its wrappers removed.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedType {
    Primitive(PrimitiveKind),
    Enumeration(EnumBinding),
    ContainerOf(PrimitiveKind),
    NestedSchema(Arc<Schema>),
}

impl ResolvedType {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ResolvedType::Primitive(PrimitiveKind::Int | PrimitiveKind::Float)
                | ResolvedType::ContainerOf(PrimitiveKind::Int | PrimitiveKind::Float)
        )
    }
}

/// Normalize a declared type. The error is a human-readable reason; the
/// schema builder attaches the field name.
pub fn resolve_type(declared: &DeclaredType) -> Result<ResolvedType, String> {
    match declared {
        DeclaredType::Bool => Ok(ResolvedType::Primitive(PrimitiveKind::Bool)),
        DeclaredType::Int => Ok(ResolvedType::Primitive(PrimitiveKind::Int)),
        DeclaredType::Float => Ok(ResolvedType::Primitive(PrimitiveKind::Float)),
        DeclaredType::Str => Ok(ResolvedType::Primitive(PrimitiveKind::Str)),
        DeclaredType::Enum(binding) => {
            if binding.literals.is_empty() {
                return Err(format!("enumeration {} has no literals", binding.name));
            }
            Ok(ResolvedType::Enumeration(binding.clone()))
        }
        DeclaredType::List(element) => match element.primitive() {
            Some(kind) => Ok(ResolvedType::ContainerOf(kind)),
            None => Err("containers may only hold bool, int, float or string elements".into()),
        },
        DeclaredType::Nested(schema) => Ok(ResolvedType::NestedSchema(Arc::clone(schema))),
        DeclaredType::Optional(inner) => unwrap_optional(inner),
        DeclaredType::Union(members) => match members.as_slice() {
            [only] => resolve_type(only),
            _ => Err(format!(
                "union of {} members is not a recognized type",
                members.len()
            )),
        },
    }
}

/// Strip one optional wrapper. Only primitives and containers unwrap.
fn unwrap_optional(inner: &DeclaredType) -> Result<ResolvedType, String> {
    match inner {
        DeclaredType::Union(members) if members.len() > 1 => Err(format!(
            "optional of a union with {} non-null members is not supported",
            members.len()
        )),
        DeclaredType::Union(members) => match members.first() {
            Some(only) => unwrap_optional(only),
            None => Err("optional of an empty union".into()),
        },
        DeclaredType::List(_) => resolve_type(inner),
        other => match other.primitive() {
            Some(kind) => Ok(ResolvedType::Primitive(kind)),
            None => Err("optional wrapper only applies to primitive or container types".into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_resolve_directly() {
        assert_eq!(
            resolve_type(&DeclaredType::Int).unwrap(),
            ResolvedType::Primitive(PrimitiveKind::Int)
        );
        assert_eq!(
            resolve_type(&DeclaredType::Str).unwrap(),
            ResolvedType::Primitive(PrimitiveKind::Str)
        );
    }

    #[test]
    fn optional_primitive_unwraps() {
        let ty = DeclaredType::optional(DeclaredType::Float);
        assert_eq!(
            resolve_type(&ty).unwrap(),
            ResolvedType::Primitive(PrimitiveKind::Float)
        );
    }

    #[test]
    fn optional_container_unwraps() {
        let ty = DeclaredType::optional(DeclaredType::list(DeclaredType::Int));
        assert_eq!(
            resolve_type(&ty).unwrap(),
            ResolvedType::ContainerOf(PrimitiveKind::Int)
        );
    }

    #[test]
    fn optional_of_multi_member_union_fails() {
        let ty = DeclaredType::optional(DeclaredType::Union(vec![
            DeclaredType::Int,
            DeclaredType::Str,
        ]));
        let reason = resolve_type(&ty).unwrap_err();
        assert!(reason.contains("union"));
    }

    #[test]
    fn optional_of_single_member_union_unwraps() {
        let ty = DeclaredType::optional(DeclaredType::Union(vec![DeclaredType::Int]));
        assert_eq!(
            resolve_type(&ty).unwrap(),
            ResolvedType::Primitive(PrimitiveKind::Int)
        );
    }

    #[test]
    fn optional_enum_is_unsupported() {
        let ty = DeclaredType::optional(DeclaredType::Enum(EnumBinding::new("Mode", ["a"])));
        assert!(resolve_type(&ty).is_err());
    }

    #[test]
    fn optional_nested_is_not_unwrapped() {
        let schema = Schema::builder("Inner").build().unwrap();
        let ty = DeclaredType::optional(DeclaredType::nested(schema));
        assert!(resolve_type(&ty).is_err());
    }

    #[test]
    fn container_of_nested_is_unsupported() {
        let schema = Schema::builder("Inner").build().unwrap();
        let ty = DeclaredType::list(DeclaredType::nested(schema));
        assert!(resolve_type(&ty).is_err());
    }

    #[test]
    fn empty_enum_is_unsupported() {
        let ty = DeclaredType::Enum(EnumBinding::new("Empty", Vec::<String>::new()));
        assert!(resolve_type(&ty).is_err());
    }

    #[test]
    fn bool_detection_sees_through_optional() {
        assert!(DeclaredType::Bool.is_bool());
        assert!(DeclaredType::optional(DeclaredType::Bool).is_bool());
        assert!(!DeclaredType::list(DeclaredType::Bool).is_bool());
    }
}
