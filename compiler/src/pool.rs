use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    defaults::{parse_default_value, DefaultLiteral},
    error::SmeError,
    registry::AstRegistry,
    resolver::{is_parametric_type_name, parse_parametric, split_qualified_name, Parametric},
    types::{TypeDescriptor, TypeKind, PRIMITIVE_TYPES},
};

/// Descriptors of one optionality.
#[derive(Debug, Default)]
struct Partition {
    no_default:   HashMap<String, Arc<TypeDescriptor>>,
    with_default: HashMap<String, HashMap<DefaultLiteral, Arc<TypeDescriptor>>>,
}

impl Partition {
    /// Pre-populated with one instance per primitive type.
    fn with_primitives(is_optional: bool) -> Self {
        let mut partition = Partition::default();
        for name in PRIMITIVE_TYPES.iter() {
            if let Some(kind) = TypeKind::primitive(name) {
                let descriptor = TypeDescriptor::new(name.to_string(), kind, is_optional, None);
                partition.no_default.insert(name.to_string(), Arc::new(descriptor));
            }
        }
        partition
    }

    fn get(&self, type_name: &str, default: Option<&DefaultLiteral>) -> Option<&Arc<TypeDescriptor>> {
        match default {
            Some(literal) => self.with_default.get(type_name)?.get(literal),
            None => self.no_default.get(type_name),
        }
    }

    fn insert(&mut self, type_name: &str, default: Option<&DefaultLiteral>, t: Arc<TypeDescriptor>) {
        match default {
            Some(literal) => {
                self.with_default
                    .entry(type_name.to_string())
                    .or_default()
                    .insert(literal.clone(), t);
            }
            None => {
                self.no_default.insert(type_name.to_string(), t);
            }
        }
    }
}

/// Interning table for type descriptors keyed by
/// `(canonical type name, optionality, default literal)`.
///
/// Only canonical names (see [`crate::resolver::unwrap_type_name`]) may be passed in.
#[derive(Debug)]
pub struct TypePool {
    required: Partition,
    optional: Partition,
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}

impl TypePool {
    pub fn new() -> Self {
        TypePool {
            required: Partition::with_primitives(false),
            optional: Partition::with_primitives(true),
        }
    }

    fn partition(&self, is_optional: bool) -> &Partition {
        if is_optional {
            &self.optional
        } else {
            &self.required
        }
    }

    /// Pure lookup.
    pub fn get(
        &self,
        type_name: &str,
        is_optional: bool,
        default: Option<&DefaultLiteral>,
    ) -> Option<Arc<TypeDescriptor>> {
        self.partition(is_optional).get(type_name, default).cloned()
    }

    /// Looks the descriptor up, constructing and inserting it on a miss.
    /// User-defined names create referenced-only structs in `registry`.
    pub fn get_or_create(
        &mut self,
        registry: &mut AstRegistry,
        type_name: &str,
        is_optional: bool,
        default: Option<&DefaultLiteral>,
    ) -> Result<Arc<TypeDescriptor>, SmeError> {
        if let Some(t) = self.get(type_name, is_optional, default) {
            trace!(type_name, is_optional, "type pool hit");
            return Ok(t);
        }

        let kind = self.build_kind(registry, type_name)?;
        let default_value = match default {
            Some(literal) => Some(parse_default_value(type_name, &kind, is_optional, literal)?),
            None => None,
        };
        let t = Arc::new(TypeDescriptor::new(
            type_name.to_string(),
            kind,
            is_optional,
            default_value,
        ));
        debug!(type_name, is_optional, id = t.id(), "type pool miss, descriptor created");

        let partition = if is_optional {
            &mut self.optional
        } else {
            &mut self.required
        };
        partition.insert(type_name, default, Arc::clone(&t));
        Ok(t)
    }

    fn build_kind(&mut self, registry: &mut AstRegistry, type_name: &str) -> Result<TypeKind, SmeError> {
        if let Some(kind) = TypeKind::primitive(type_name) {
            return Ok(kind);
        }
        if is_parametric_type_name(type_name) {
            return match parse_parametric(type_name)? {
                Parametric::List(value) => Ok(TypeKind::List {
                    value: self.get_or_create(registry, value, false, None)?,
                }),
                Parametric::Map(key, value) => Ok(TypeKind::Map {
                    key:   self.get_or_create(registry, key, false, None)?,
                    value: self.get_or_create(registry, value, false, None)?,
                }),
            };
        }
        let (package, name) = split_qualified_name(type_name)?;
        let target = registry.reference_struct(package, name)?;
        Ok(TypeKind::UserDefined { target })
    }

    /// Number of interned descriptors, pre-populated primitives included.
    pub fn len(&self) -> usize {
        [&self.required, &self.optional]
            .iter()
            .map(|p| p.no_default.len() + p.with_default.values().map(HashMap::len).sum::<usize>())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
