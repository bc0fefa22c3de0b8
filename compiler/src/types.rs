use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::identity;

pub const PRIMITIVE_TYPES: [&str; 13] = [
    "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32", "uint64", "float", "double",
    "string", "char", "bool",
];

pub fn is_primitive_type_name(name: &str) -> bool {
    PRIMITIVE_TYPES.contains(&name)
}

/// Package-qualified reference to a struct, resolved by name rather than by node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StructRef {
    pub package: String,
    pub name:    String,
    pub id:      u32,
}

impl StructRef {
    pub fn new(package: &str, name: &str) -> Self {
        StructRef {
            package: package.to_string(),
            name:    name.to_string(),
            id:      identity::struct_identity(package, name),
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.package, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    Integer { bits: u8, signed: bool },
    Floating { bits: u8 },
    String,
    Char,
    Bool,
    List { value: Arc<TypeDescriptor> },
    Map {
        key:   Arc<TypeDescriptor>,
        value: Arc<TypeDescriptor>,
    },
    UserDefined { target: StructRef },
}

impl TypeKind {
    /// Base variant for a primitive type name.
    pub fn primitive(name: &str) -> Option<TypeKind> {
        let kind = match name {
            "int8"   => TypeKind::Integer { bits: 8, signed: true },
            "int16"  => TypeKind::Integer { bits: 16, signed: true },
            "int32"  => TypeKind::Integer { bits: 32, signed: true },
            "int64"  => TypeKind::Integer { bits: 64, signed: true },
            "uint8"  => TypeKind::Integer { bits: 8, signed: false },
            "uint16" => TypeKind::Integer { bits: 16, signed: false },
            "uint32" => TypeKind::Integer { bits: 32, signed: false },
            "uint64" => TypeKind::Integer { bits: 64, signed: false },
            "float"  => TypeKind::Floating { bits: 32 },
            "double" => TypeKind::Floating { bits: 64 },
            "string" => TypeKind::String,
            "char"   => TypeKind::Char,
            "bool"   => TypeKind::Bool,
            _ => return None,
        };
        Some(kind)
    }

    /// Discriminant byte used by the identity encoding. Values are part of the
    /// wire contract and must never be reassigned.
    pub fn discriminant(&self) -> u8 {
        match self {
            TypeKind::Integer { bits, signed } => {
                let base = if *signed { 0 } else { 4 };
                base + match bits {
                    8  => 0,
                    16 => 1,
                    32 => 2,
                    _  => 3,
                }
            }
            TypeKind::Floating { bits: 32 } => 8,
            TypeKind::Floating { .. }       => 9,
            TypeKind::String                => 10,
            TypeKind::Char                  => 11,
            TypeKind::Bool                  => 12,
            TypeKind::List { .. }           => 14,
            TypeKind::Map { .. }            => 15,
            TypeKind::UserDefined { .. }    => 16,
        }
    }
}

/// Validated default value of a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    Int(i64),
    #[serde(rename = "uint")]
    UInt(u64),
    Float(f64),
    Bool(bool),
    Char(char),
    Str(String),
    Null,
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Int(v)   => write!(f, "{}", v),
            DefaultValue::UInt(v)  => write!(f, "{}", v),
            DefaultValue::Float(v) => write!(f, "{}", v),
            DefaultValue::Bool(v)  => write!(f, "{}", v),
            DefaultValue::Char(v)  => write!(f, "{}", v),
            DefaultValue::Str(v)   => write!(f, "{}", v),
            DefaultValue::Null     => write!(f, "null"),
        }
    }
}

/// Immutable description of a field type. Instances are interned by the type
/// pool and shared behind `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDescriptor {
    name:        String,
    id:          u32,
    #[serde(flatten)]
    kind:        TypeKind,
    is_optional: bool,
    default:     Option<DefaultValue>,
}

impl TypeDescriptor {
    /// `name` must be the canonical (unwrapped, package-qualified) type name.
    pub fn new(
        name: String,
        kind: TypeKind,
        is_optional: bool,
        default: Option<DefaultValue>,
    ) -> Self {
        let id = identity::type_id(&kind, is_optional);
        TypeDescriptor {
            name,
            id,
            kind,
            is_optional,
            default,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Canonical type name, e.g. `list[map[string,pkg.Foo]]`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn is_optional(&self) -> bool {
        self.is_optional
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn is_parametric(&self) -> bool {
        matches!(self.kind, TypeKind::List { .. } | TypeKind::Map { .. })
    }

    /// Informational size hint in bytes; not a wire-format contract.
    pub fn size_of(&self) -> usize {
        match &self.kind {
            TypeKind::Integer { bits, .. } | TypeKind::Floating { bits } => *bits as usize / 8,
            TypeKind::Char | TypeKind::Bool => 1,
            TypeKind::String                => 4,
            TypeKind::List { .. }           => 4,
            TypeKind::Map { .. }            => 8,
            TypeKind::UserDefined { .. }    => 0,
        }
    }

    /// Struct referenced by this type, if it is user defined.
    pub fn struct_ref(&self) -> Option<&StructRef> {
        match &self.kind {
            TypeKind::UserDefined { target } => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_optional {
            write!(f, "optional ")?;
        }
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primitive(name: &str, optional: bool) -> TypeDescriptor {
        TypeDescriptor::new(name.to_string(), TypeKind::primitive(name).unwrap(), optional, None)
    }

    #[test]
    fn test_every_primitive_has_a_kind() {
        for name in PRIMITIVE_TYPES.iter() {
            assert!(TypeKind::primitive(name).is_some(), "{} has no kind", name);
        }
        assert!(TypeKind::primitive("byte").is_none());
    }

    #[test]
    fn test_discriminants_are_distinct() {
        let mut seen: Vec<u8> = PRIMITIVE_TYPES
            .iter()
            .map(|n| TypeKind::primitive(n).unwrap().discriminant())
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), PRIMITIVE_TYPES.len());
    }

    #[test]
    fn test_id_ignores_default_but_not_optionality() {
        let plain = primitive("int32", false);
        let defaulted = TypeDescriptor::new(
            "int32".to_string(),
            TypeKind::primitive("int32").unwrap(),
            false,
            Some(DefaultValue::Int(5)),
        );
        assert_eq!(plain.id(), defaulted.id());
        assert_ne!(plain.id(), primitive("int32", true).id());
        assert_ne!(plain.id(), primitive("uint32", false).id());
    }

    #[test]
    fn test_list_id_depends_on_element() {
        let ints = TypeDescriptor::new(
            "list[int32]".to_string(),
            TypeKind::List { value: Arc::new(primitive("int32", false)) },
            false,
            None,
        );
        let strings = TypeDescriptor::new(
            "list[string]".to_string(),
            TypeKind::List { value: Arc::new(primitive("string", false)) },
            false,
            None,
        );
        assert_ne!(ints.id(), strings.id());
        assert!(ints.is_parametric());
        assert_eq!(ints.size_of(), 4);
    }

    #[test]
    fn test_size_hints() {
        assert_eq!(primitive("int8", false).size_of(), 1);
        assert_eq!(primitive("uint64", false).size_of(), 8);
        assert_eq!(primitive("float", false).size_of(), 4);
        assert_eq!(primitive("double", false).size_of(), 8);
        assert_eq!(primitive("string", false).size_of(), 4);
        assert!(!primitive("bool", false).is_parametric());
    }
}
