//! Lexical grammar of a field declaration line:
//!
//! ```text
//! [optional] <typeExpr> <name>[=<default>][, <name>[=<default>]]*
//! ```

use crate::{
    defaults::DefaultLiteral,
    error::SmeError,
    utils::{error, is_identifier, quote},
};

const OPTIONAL_KEYWORD: &str = "optional";

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDeclarations {
    pub is_optional: bool,
    /// Type expression with whitespace inside brackets removed.
    pub type_expr:   String,
    pub type_column: usize,
    pub fields:      Vec<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name:    String,
    pub column:  usize,
    pub default: Option<DefaultLiteral>,
}

struct Cursor<'a> {
    text:   &'a str,
    pos:    usize,
    line:   usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.pos += 1;
        }
    }

    /// Column of the current position in the physical line.
    fn column(&self) -> usize {
        self.column + self.pos
    }

    fn error_at(&self, pos: usize, msg: &str) -> SmeError {
        error(msg, self.line, self.column + pos)
    }

    fn found(&self) -> String {
        match self.peek() {
            Some(c) => quote(&c.to_string()),
            None => "end of line".to_string(),
        }
    }
}

/// Parses one field declaration line. `column` is the column of the first
/// character of `text` in the physical line.
pub fn parse_field_declarations(
    text: &str,
    line: usize,
    column: usize,
) -> Result<FieldDeclarations, SmeError> {
    let mut cursor = Cursor { text, pos: 0, line, column };

    cursor.skip_whitespace();
    let is_optional = match text[cursor.pos..].strip_prefix(OPTIONAL_KEYWORD) {
        Some(rest) if rest.starts_with([' ', '\t']) => {
            cursor.pos += OPTIONAL_KEYWORD.len();
            cursor.skip_whitespace();
            true
        }
        _ => false,
    };

    let type_column = cursor.column();
    let type_expr = read_type_expr(&mut cursor)?;

    let mut fields = Vec::new();
    loop {
        cursor.skip_whitespace();
        fields.push(read_field(&mut cursor, &type_expr)?);
        cursor.skip_whitespace();
        match cursor.peek() {
            None => break,
            Some(',') => {
                cursor.bump();
            }
            Some(_) => {
                return Err(cursor.error_at(
                    cursor.pos,
                    &format!("expected \",\" or end of line, but got: {}", cursor.found()),
                ))
            }
        }
    }

    Ok(FieldDeclarations {
        is_optional,
        type_expr,
        type_column,
        fields,
    })
}

/// Reads a type expression up to the first whitespace outside brackets.
fn read_type_expr(cursor: &mut Cursor) -> Result<String, SmeError> {
    let start = cursor.pos;
    let mut type_expr = String::new();
    let mut depth = 0usize;
    while let Some(c) = cursor.peek() {
        match c {
            ' ' | '\t' if depth == 0 => break,
            ' ' | '\t' => {}
            '[' => {
                depth += 1;
                type_expr.push(c);
            }
            ']' => {
                if depth == 0 {
                    return Err(cursor.error_at(cursor.pos, "unexpected closing bracket"));
                }
                depth -= 1;
                type_expr.push(c);
            }
            _ => type_expr.push(c),
        }
        cursor.bump();
    }
    if depth > 0 {
        return Err(cursor.error_at(
            cursor.pos,
            "expected closing bracket, but got: end of line",
        ));
    }
    if type_expr.is_empty() {
        return Err(cursor.error_at(start, "expected type name, but got: end of line"));
    }
    Ok(type_expr)
}

fn read_field(cursor: &mut Cursor, type_expr: &str) -> Result<FieldSpec, SmeError> {
    let start = cursor.pos;
    while let Some(c) = cursor.peek() {
        if matches!(c, ' ' | '\t' | ',' | '=') {
            break;
        }
        cursor.bump();
    }
    let name = &cursor.text[start..cursor.pos];
    if name.is_empty() {
        return Err(cursor.error_at(
            start,
            &format!("expected field name, but got: {}", cursor.found()),
        ));
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(cursor.error_at(start, "field name can not start with a number"));
    }
    if !is_identifier(name) {
        return Err(cursor.error_at(start, &format!("incorrect field name: {}", quote(name))));
    }

    let mut field = FieldSpec {
        name:    name.to_string(),
        column:  cursor.column + start,
        default: None,
    };

    cursor.skip_whitespace();
    if cursor.peek() == Some('=') {
        cursor.bump();
        cursor.skip_whitespace();
        field.default = Some(if type_expr == "string" {
            read_string_default(cursor)?
        } else {
            read_plain_default(cursor)?
        });
    }
    Ok(field)
}

/// String defaults are delimited by double quotes; an unquoted `null` is the
/// null literal.
fn read_string_default(cursor: &mut Cursor) -> Result<DefaultLiteral, SmeError> {
    let start = cursor.pos;
    if cursor.peek() != Some('"') {
        let token = read_until_separator(cursor);
        if token == crate::defaults::NULL_LITERAL {
            return Ok(DefaultLiteral::Null);
        }
        return Err(cursor.error_at(
            start,
            "expected opening quotes in string default value declaration",
        ));
    }
    cursor.bump();
    let content_start = cursor.pos;
    loop {
        match cursor.bump() {
            Some('"') => break,
            Some(_) => {}
            None => {
                return Err(cursor.error_at(start, "expected closing quotes, but got: end of line"))
            }
        }
    }
    let content = &cursor.text[content_start..cursor.pos - 1];
    Ok(DefaultLiteral::Text(content.to_string()))
}

/// Non-string defaults run until the next `,` or the end of the line.
fn read_plain_default(cursor: &mut Cursor) -> Result<DefaultLiteral, SmeError> {
    let start = cursor.pos;
    let token = read_until_separator(cursor);
    if token.is_empty() {
        return Err(cursor.error_at(
            start,
            &format!("expected default value, but got: {}", cursor.found()),
        ));
    }
    Ok(DefaultLiteral::from_token(&token))
}

fn read_until_separator(cursor: &mut Cursor) -> String {
    let start = cursor.pos;
    while let Some(c) = cursor.peek() {
        if c == ',' {
            break;
        }
        cursor.bump();
    }
    cursor.text[start..cursor.pos].trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<FieldDeclarations, SmeError> {
        parse_field_declarations(text, 7, 5)
    }

    fn position(err: SmeError) -> (usize, usize) {
        err.position().expect("error should be positioned")
    }

    #[test]
    fn test_single_field() {
        let decl = parse("int32 x").unwrap();
        assert!(!decl.is_optional);
        assert_eq!(decl.type_expr, "int32");
        assert_eq!(decl.type_column, 5);
        assert_eq!(
            decl.fields,
            vec![FieldSpec { name: "x".into(), column: 11, default: None }]
        );
    }

    #[test]
    fn test_multiple_fields_with_defaults() {
        let decl = parse("optional int32 x=5, y , z = -3").unwrap();
        assert!(decl.is_optional);
        let names: Vec<&str> = decl.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
        assert_eq!(decl.fields[0].default, Some(DefaultLiteral::Text("5".into())));
        assert_eq!(decl.fields[1].default, None);
        assert_eq!(decl.fields[2].default, Some(DefaultLiteral::Text("-3".into())));
    }

    #[test]
    fn test_string_defaults() {
        let decl = parse("string a = \"x, y\", b=\"\", c").unwrap();
        assert_eq!(decl.fields[0].default, Some(DefaultLiteral::Text("x, y".into())));
        assert_eq!(decl.fields[1].default, Some(DefaultLiteral::Text("".into())));
        assert_eq!(decl.fields[2].default, None);

        let decl = parse("optional string s = null").unwrap();
        assert_eq!(decl.fields[0].default, Some(DefaultLiteral::Null));
    }

    #[test]
    fn test_parametric_type_with_spaces() {
        let decl = parse("map[string, list[int32]] index").unwrap();
        assert_eq!(decl.type_expr, "map[string,list[int32]]");
        assert_eq!(decl.fields[0].name, "index");
    }

    #[test]
    fn test_null_is_recognized_for_any_type() {
        let decl = parse("optional list[int32] xs = null").unwrap();
        assert_eq!(decl.fields[0].default, Some(DefaultLiteral::Null));
    }

    #[test]
    fn test_field_name_starting_with_digit() {
        let err = parse("int32 1x").unwrap_err();
        assert_eq!(position(err), (7, 11));
    }

    #[test]
    fn test_blank_field_name() {
        assert!(parse("int32").is_err());
        assert!(parse("int32 x,").is_err());
        let err = parse("int32 x, , y").unwrap_err();
        assert_eq!(position(err), (7, 14));
    }

    #[test]
    fn test_unterminated_string_default() {
        let err = parse("string s = \"abc").unwrap_err();
        assert_eq!(position(err), (7, 16));
        assert!(parse("string s = abc").is_err());
    }

    #[test]
    fn test_unbalanced_brackets() {
        assert!(parse("list[int32 xs").is_err());
        assert!(parse("int32] x").is_err());
    }

    #[test]
    fn test_empty_default() {
        assert!(parse("int32 x = , y").is_err());
        assert!(parse("int32 x =").is_err());
    }

    #[test]
    fn test_garbage_after_field() {
        assert!(parse("int32 x y").is_err());
    }
}
