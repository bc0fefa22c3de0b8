use crate::{
    error::SmeError,
    types::{DefaultValue, TypeKind},
};

pub const NULL_LITERAL: &str = "null";

/// Default value as written in the source, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DefaultLiteral {
    Null,
    /// Literal text. String literals arrive with their quotes already stripped.
    Text(String),
}

impl DefaultLiteral {
    /// Classifies an unquoted token.
    pub fn from_token(token: &str) -> Self {
        if token == NULL_LITERAL {
            DefaultLiteral::Null
        } else {
            DefaultLiteral::Text(token.to_string())
        }
    }
}

/// Converts a default-value literal into a value of the given base type.
/// `type_name` is only used for error reporting.
pub fn parse_default_value(
    type_name: &str,
    kind: &TypeKind,
    is_optional: bool,
    literal: &DefaultLiteral,
) -> Result<DefaultValue, SmeError> {
    let literal = match literal {
        DefaultLiteral::Null if is_optional => return Ok(DefaultValue::Null),
        DefaultLiteral::Null => {
            return Err(SmeError::NullDefaultOnRequired(type_name.to_string()))
        }
        DefaultLiteral::Text(text) => text.as_str(),
    };

    let invalid = |msg: &str| SmeError::InvalidDefaultValue {
        type_name: type_name.to_string(),
        value:     literal.to_string(),
        msg:       msg.to_string(),
    };

    match kind {
        TypeKind::Integer { bits, signed: true } => {
            let value: i64 = literal.parse().map_err(|_| invalid("not a signed integer"))?;
            let (min, max) = signed_range(*bits);
            if value < min || value > max {
                return Err(invalid(&format!("out of range for {}-bit signed integer", bits)));
            }
            Ok(DefaultValue::Int(value))
        }
        TypeKind::Integer { bits, signed: false } => {
            let value: u64 = literal.parse().map_err(|_| invalid("not an unsigned integer"))?;
            if value > unsigned_max(*bits) {
                return Err(invalid(&format!("out of range for {}-bit unsigned integer", bits)));
            }
            Ok(DefaultValue::UInt(value))
        }
        TypeKind::Floating { bits: 32 } => {
            let value: f32 = literal.parse().map_err(|_| invalid("not a floating point number"))?;
            if !value.is_finite() {
                return Err(invalid("out of range for 32-bit float"));
            }
            Ok(DefaultValue::Float(value as f64))
        }
        TypeKind::Floating { .. } => {
            let value: f64 = literal.parse().map_err(|_| invalid("not a floating point number"))?;
            if !value.is_finite() {
                return Err(invalid("out of range for 64-bit float"));
            }
            Ok(DefaultValue::Float(value))
        }
        TypeKind::Bool => match literal {
            "true" | "1"  => Ok(DefaultValue::Bool(true)),
            "false" | "0" => Ok(DefaultValue::Bool(false)),
            _ => Err(invalid("expected one of true, false, 1, 0")),
        },
        TypeKind::Char => {
            let mut chars = literal.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(DefaultValue::Char(c)),
                _ => Err(invalid("expected exactly one character")),
            }
        }
        TypeKind::String => Ok(DefaultValue::Str(literal.to_string())),
        TypeKind::List { .. } | TypeKind::Map { .. } | TypeKind::UserDefined { .. } => {
            Err(invalid("only optional fields of this type may have a default, and only null"))
        }
    }
}

fn signed_range(bits: u8) -> (i64, i64) {
    match bits {
        8  => (i8::MIN as i64, i8::MAX as i64),
        16 => (i16::MIN as i64, i16::MAX as i64),
        32 => (i32::MIN as i64, i32::MAX as i64),
        _  => (i64::MIN, i64::MAX),
    }
}

fn unsigned_max(bits: u8) -> u64 {
    match bits {
        8  => u8::MAX as u64,
        16 => u16::MAX as u64,
        32 => u32::MAX as u64,
        _  => u64::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str, optional: bool, literal: &str) -> Result<DefaultValue, SmeError> {
        let kind = TypeKind::primitive(name).unwrap();
        parse_default_value(name, &kind, optional, &DefaultLiteral::from_token(literal))
    }

    #[test]
    fn test_integer_ranges() {
        assert_eq!(parse("int8", false, "-128").unwrap(), DefaultValue::Int(-128));
        assert!(parse("int8", false, "128").is_err());
        assert_eq!(parse("uint8", false, "255").unwrap(), DefaultValue::UInt(255));
        assert!(parse("uint8", false, "256").is_err());
        assert!(parse("uint32", false, "-1").is_err());
        assert_eq!(
            parse("uint64", false, "18446744073709551615").unwrap(),
            DefaultValue::UInt(u64::MAX)
        );
        assert!(parse("int32", false, "5.0").is_err());
    }

    #[test]
    fn test_floats() {
        assert_eq!(parse("double", false, "2.5").unwrap(), DefaultValue::Float(2.5));
        assert_eq!(parse("float", false, "0.5").unwrap(), DefaultValue::Float(0.5));
        assert!(parse("float", false, "1e39").is_err());
        assert!(parse("double", false, "abc").is_err());
    }

    #[test]
    fn test_bool_literals() {
        assert_eq!(parse("bool", false, "true").unwrap(), DefaultValue::Bool(true));
        assert_eq!(parse("bool", false, "1").unwrap(), DefaultValue::Bool(true));
        assert_eq!(parse("bool", false, "false").unwrap(), DefaultValue::Bool(false));
        assert_eq!(parse("bool", false, "0").unwrap(), DefaultValue::Bool(false));
        assert!(parse("bool", false, "yes").is_err());
        assert!(parse("bool", false, "TRUE").is_err());
    }

    #[test]
    fn test_char_and_string() {
        assert_eq!(parse("char", false, "x").unwrap(), DefaultValue::Char('x'));
        assert!(parse("char", false, "xy").is_err());
        assert!(parse("char", false, "").is_err());
        assert_eq!(
            parse("string", false, "\"kept\"").unwrap(),
            DefaultValue::Str("\"kept\"".to_string())
        );
    }

    #[test]
    fn test_quoted_null_is_a_string() {
        let kind = TypeKind::String;
        let quoted = DefaultLiteral::Text("null".to_string());
        assert_eq!(
            parse_default_value("string", &kind, false, &quoted).unwrap(),
            DefaultValue::Str("null".to_string())
        );
    }

    #[test]
    fn test_null_on_parametric_optional() {
        let kind = TypeKind::List {
            value: std::sync::Arc::new(crate::types::TypeDescriptor::new(
                "int32".to_string(),
                TypeKind::primitive("int32").unwrap(),
                false,
                None,
            )),
        };
        let null = DefaultLiteral::Null;
        assert_eq!(
            parse_default_value("list[int32]", &kind, true, &null).unwrap(),
            DefaultValue::Null
        );
        let text = DefaultLiteral::Text("[]".to_string());
        assert!(parse_default_value("list[int32]", &kind, true, &text).is_err());
    }

    #[test]
    fn test_null_requires_optional() {
        assert_eq!(parse("int32", true, "null").unwrap(), DefaultValue::Null);
        assert!(matches!(
            parse("int32", false, "null"),
            Err(SmeError::NullDefaultOnRequired(_))
        ));
    }
}
