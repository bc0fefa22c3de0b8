use lazy_static::lazy_static;
use regex::Regex;

use crate::error::SmeError;

lazy_static! {
    pub static ref SYNTAX_VERSION: Regex = Regex::new(r"^\d+\.\d+\.\d+$").unwrap();
    pub static ref IDENTIFIER:     Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap();
    pub static ref QUALIFIED_NAME: Regex =
        Regex::new(r"^(?:[A-Za-z][A-Za-z0-9_]*\.)?[A-Za-z][A-Za-z0-9_]*$").unwrap();
}

pub const KEYWORDS: [&str; 4] = ["syntax", "package", "struct", "optional"];

pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

pub fn error(msg: &str, line: usize, column: usize) -> SmeError {
    SmeError::ParseError {
        msg: msg.to_string(),
        line,
        column,
    }
}

pub fn is_identifier(text: &str) -> bool {
    IDENTIFIER.is_match(text)
}

/// Byte offset of the first occurrence of `pattern` outside string literals.
///
/// A string literal opens with a `"` that directly follows `=` (whitespace
/// aside) and closes with the next `"`. Any other quote, including one that is
/// never closed, is an ordinary character.
pub fn find_unquoted(text: &str, pattern: &str) -> Option<usize> {
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        if rest.starts_with('"') && opens_literal(&text[..i]) {
            if let Some(close) = rest[1..].find('"') {
                i += close + 2;
                continue;
            }
        }
        if rest.starts_with(pattern) {
            return Some(i);
        }
        i += rest.chars().next().map_or(1, char::len_utf8);
    }
    None
}

fn opens_literal(before: &str) -> bool {
    before.trim_end_matches([' ', '\t']).ends_with('=')
}
