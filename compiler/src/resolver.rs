//! Type expression unwrapping.
//!
//! A type expression as written in a field declaration (`list[map[string,Foo]]`)
//! is rewritten into its canonical form, where every struct name is qualified
//! with its package (`list[map[string,pkg.Foo]]`). The canonical form is the key
//! used by the type pool, so differently spelled references to one type share
//! one descriptor.

use crate::{
    error::SmeError,
    types::is_primitive_type_name,
    utils::QUALIFIED_NAME,
};

pub const LIST_PREFIX: &str = "list[";
pub const MAP_PREFIX:  &str = "map[";

/// Parameters of a parametric type expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parametric<'a> {
    List(&'a str),
    Map(&'a str, &'a str),
}

pub fn is_parametric_type_name(type_name: &str) -> bool {
    type_name.starts_with(LIST_PREFIX) || type_name.starts_with(MAP_PREFIX)
}

/// Returns the canonical form of `type_name`, qualifying bare struct names with
/// `package`.
pub fn unwrap_type_name(package: &str, type_name: &str) -> Result<String, SmeError> {
    if is_primitive_type_name(type_name) {
        return Ok(type_name.to_string());
    }
    if is_parametric_type_name(type_name) {
        return match parse_parametric(type_name)? {
            Parametric::List(value) => {
                Ok(format!("list[{}]", unwrap_type_name(package, value)?))
            }
            Parametric::Map(key, value) => Ok(format!(
                "map[{},{}]",
                unwrap_type_name(package, key)?,
                unwrap_type_name(package, value)?
            )),
        };
    }
    if type_name == "list" || type_name == "map" {
        return Err(invalid(type_name, "expected type parameters in brackets"));
    }
    if !QUALIFIED_NAME.is_match(type_name) {
        return Err(invalid(type_name, "not a valid type name"));
    }
    if type_name.contains('.') {
        Ok(type_name.to_string())
    } else {
        Ok(format!("{}.{}", package, type_name))
    }
}

/// Splits a qualified struct name into `(package, struct)`.
pub fn split_qualified_name(type_name: &str) -> Result<(&str, &str), SmeError> {
    match type_name.split_once('.') {
        Some((package, name)) if QUALIFIED_NAME.is_match(type_name) => Ok((package, name)),
        _ => Err(SmeError::UnknownType(type_name.to_string())),
    }
}

/// Parses the bracketed parameter list of `list[...]` or `map[...]`.
///
/// Parameters are split on commas at bracket depth zero only, so nested
/// parametric types keep their own commas.
pub fn parse_parametric(type_name: &str) -> Result<Parametric<'_>, SmeError> {
    let (prefix, is_list) = if type_name.starts_with(LIST_PREFIX) {
        (LIST_PREFIX, true)
    } else if type_name.starts_with(MAP_PREFIX) {
        (MAP_PREFIX, false)
    } else {
        return Err(invalid(type_name, "not a parametric type"));
    };

    let inner_start = prefix.len();
    let mut depth = 1usize;
    let mut splits = Vec::new();
    let mut close = None;
    for (i, c) in type_name.char_indices().skip(inner_start) {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            ',' if depth == 1 => splits.push(i),
            _ => {}
        }
    }

    let close = close.ok_or_else(|| invalid(type_name, "missing closing bracket"))?;
    if close != type_name.len() - 1 {
        return Err(invalid(type_name, "unexpected characters after closing bracket"));
    }

    let mut params = Vec::with_capacity(splits.len() + 1);
    let mut start = inner_start;
    for split in splits.into_iter().chain(std::iter::once(close)) {
        let param = &type_name[start..split];
        if param.is_empty() {
            return Err(invalid(type_name, "empty type parameter"));
        }
        params.push(param);
        start = split + 1;
    }

    match (is_list, params.as_slice()) {
        (true, &[value]) => Ok(Parametric::List(value)),
        (false, &[key, value]) => Ok(Parametric::Map(key, value)),
        (true, _) => Err(invalid(
            type_name,
            &format!("list takes exactly one type parameter, got {}", params.len()),
        )),
        (false, _) => Err(invalid(
            type_name,
            &format!("map takes exactly two type parameters, got {}", params.len()),
        )),
    }
}

fn invalid(type_name: &str, msg: &str) -> SmeError {
    SmeError::InvalidTypeExpression {
        type_name: type_name.to_string(),
        msg:       msg.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_are_unchanged() {
        assert_eq!(unwrap_type_name("p", "int32").unwrap(), "int32");
        assert_eq!(unwrap_type_name("p", "string").unwrap(), "string");
    }

    #[test]
    fn test_struct_names_are_qualified() {
        assert_eq!(unwrap_type_name("p", "Foo").unwrap(), "p.Foo");
        assert_eq!(unwrap_type_name("p", "q.Foo").unwrap(), "q.Foo");
    }

    #[test]
    fn test_nested_parametric() {
        assert_eq!(
            unwrap_type_name("p", "list[map[string,Foo]]").unwrap(),
            "list[map[string,p.Foo]]"
        );
        assert_eq!(
            unwrap_type_name("p", "map[map[int8,int16],list[q.Bar]]").unwrap(),
            "map[map[int8,int16],list[q.Bar]]"
        );
    }

    #[test]
    fn test_unwrap_is_idempotent() {
        let once = unwrap_type_name("p", "list[map[string,int32]]").unwrap();
        let twice = unwrap_type_name("p", &once).unwrap();
        assert_eq!(once, "list[map[string,int32]]");
        assert_eq!(once, twice);

        let once = unwrap_type_name("p", "map[Foo,list[Bar]]").unwrap();
        assert_eq!(unwrap_type_name("other", &once).unwrap(), once);
    }

    #[test]
    fn test_parse_parametric_splits_top_level_only() {
        assert_eq!(
            parse_parametric("map[map[a,b],list[c]]").unwrap(),
            Parametric::Map("map[a,b]", "list[c]")
        );
        assert_eq!(
            parse_parametric("list[map[a,b]]").unwrap(),
            Parametric::List("map[a,b]")
        );
    }

    #[test]
    fn test_malformed_parametric() {
        for bad in [
            "list[int32",
            "list[int32]]",
            "list[int32,int64]",
            "map[int32]",
            "map[a,b,c]",
            "list[]",
            "map[,int32]",
            "list[map[a,b]",
        ] {
            assert!(
                matches!(
                    unwrap_type_name("p", bad),
                    Err(SmeError::InvalidTypeExpression { .. })
                ),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_invalid_names() {
        assert!(unwrap_type_name("p", "a.b.C").is_err());
        assert!(unwrap_type_name("p", "9Foo").is_err());
        assert!(unwrap_type_name("p", "list").is_err());
    }

    #[test]
    fn test_split_qualified_name() {
        assert_eq!(split_qualified_name("p.Foo").unwrap(), ("p", "Foo"));
        assert!(matches!(
            split_qualified_name("Foo"),
            Err(SmeError::UnknownType(_))
        ));
    }
}
