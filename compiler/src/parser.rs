use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::{
    compiler::Compilation,
    error::SmeError,
    fields::parse_field_declarations,
    lines::SourceLine,
    resolver::unwrap_type_name,
    types::is_primitive_type_name,
    utils::{error, find_unquoted, is_identifier, quote, KEYWORDS, SYNTAX_VERSION},
};

lazy_static! {
    static ref PACKAGE_DECLARATION: Regex =
        Regex::new(r"^package[ \t]+([A-Za-z][A-Za-z0-9_]*)$").unwrap();
}

const SYNTAX_KEYWORD:  &str = "syntax";
const PACKAGE_KEYWORD: &str = "package";
const STRUCT_KEYWORD:  &str = "struct";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    ReadingSyntaxVersion,
    ReadingPackageName,
    ReadingStructName,
    ReadingStructBody,
}

impl ParserState {
    fn describe(self) -> &'static str {
        match self {
            ParserState::ReadingSyntaxVersion => "syntax version declaration",
            ParserState::ReadingPackageName   => "package declaration",
            ParserState::ReadingStructName    => "struct declaration",
            ParserState::ReadingStructBody    => "struct field declaration",
        }
    }
}

/// Names of all packages declared in `lines`, in order.
pub fn declared_packages(lines: &[SourceLine]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|l| PACKAGE_DECLARATION.captures(&l.text))
        .map(|c| c[1].to_string())
        .collect()
}

/// Line-at-a-time state machine populating the registry of a [`Compilation`].
pub struct LineParser<'c> {
    compilation:     &'c mut Compilation,
    state:           ParserState,
    line:            usize,
    current_package: Option<String>,
    current_struct:  Option<String>,
}

impl<'c> LineParser<'c> {
    pub fn new(compilation: &'c mut Compilation) -> Self {
        LineParser {
            compilation,
            state:           ParserState::ReadingSyntaxVersion,
            line:            0,
            current_package: None,
            current_struct:  None,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn parse_line(&mut self, source: &SourceLine) -> Result<(), SmeError> {
        self.line = source.line;
        let text = source.text.as_str();
        let column = source.column;
        let state = self.state;
        self.state = match state {
            ParserState::ReadingSyntaxVersion => self.read_syntax_version(text, column)?,
            ParserState::ReadingPackageName => self.read_package_name(text, column)?,
            ParserState::ReadingStructName if strip_keyword(text, PACKAGE_KEYWORD).is_some() => {
                self.state = ParserState::ReadingPackageName;
                self.read_package_name(text, column)?
            }
            ParserState::ReadingStructName => self.read_struct_name(text, column)?,
            ParserState::ReadingStructBody => self.read_struct_body(text, column)?,
        };
        Ok(())
    }

    /// Checks the parser stopped in a state where the file may end.
    pub fn finish(self, end_of_file_line: usize) -> Result<(), SmeError> {
        match self.state {
            ParserState::ReadingStructName => Ok(()),
            ParserState::ReadingStructBody => Err(error(
                &format!(
                    "expected closing curly brace of struct {}, but got: end of file",
                    quote(self.current_struct.as_deref().unwrap_or_default())
                ),
                end_of_file_line,
                1,
            )),
            state => Err(error(
                &format!("expected {}, but got: end of file", state.describe()),
                end_of_file_line,
                1,
            )),
        }
    }

    fn expect_state(&self, expected: ParserState) {
        assert_eq!(
            self.state,
            expected,
            "line parser state conflict: expected {}, but in {}",
            expected.describe(),
            self.state.describe()
        );
    }

    fn current_package(&self) -> &str {
        self.current_package
            .as_deref()
            .expect("a package is always set once the package declaration was read")
    }

    fn read_syntax_version(&mut self, text: &str, column: usize) -> Result<ParserState, SmeError> {
        self.expect_state(ParserState::ReadingSyntaxVersion);
        let (version, offset) = strip_keyword(text, SYNTAX_KEYWORD).ok_or_else(|| {
            error(
                &format!("expected 'syntax' keyword, got: {}", quote(first_word(text))),
                self.line,
                column,
            )
        })?;
        let version_column = column + offset;
        if version.is_empty() {
            return Err(error(
                "expected syntax version, but got: end of line",
                self.line,
                version_column,
            ));
        }
        if !SYNTAX_VERSION.is_match(version) {
            return Err(error(
                &format!("incorrect syntax version specified: {}", quote(version)),
                self.line,
                version_column,
            ));
        }

        let registry = self.compilation.registry_mut();
        match registry.syntax_version().map(str::to_string) {
            None => registry.init_module(version),
            Some(expected) if expected != version => {
                return Err(SmeError::SyntaxVersionMismatch {
                    expected,
                    found: version.to_string(),
                }
                .at(self.line, version_column))
            }
            Some(_) => {}
        }
        Ok(ParserState::ReadingPackageName)
    }

    fn read_package_name(&mut self, text: &str, column: usize) -> Result<ParserState, SmeError> {
        self.expect_state(ParserState::ReadingPackageName);
        let (name, offset) = strip_keyword(text, PACKAGE_KEYWORD).ok_or_else(|| {
            error(
                &format!("expected 'package' keyword, got: {}", quote(first_word(text))),
                self.line,
                column,
            )
        })?;
        let name_column = column + offset;
        if !is_identifier(name) {
            return Err(error(
                &format!("incorrect format of package name: {}", quote(name)),
                self.line,
                name_column,
            ));
        }
        if KEYWORDS.contains(&name) {
            return Err(SmeError::ReservedName(name.to_string()).at(self.line, name_column));
        }

        self.compilation
            .registry_mut()
            .declare_package(name)
            .map_err(|e| e.at(self.line, name_column))?;
        debug!(package = name, line = self.line, "package declared");
        self.current_package = Some(name.to_string());
        self.current_struct = None;
        Ok(ParserState::ReadingStructName)
    }

    fn read_struct_name(&mut self, text: &str, column: usize) -> Result<ParserState, SmeError> {
        self.expect_state(ParserState::ReadingStructName);
        let (rest, offset) = strip_keyword(text, STRUCT_KEYWORD).ok_or_else(|| {
            error(
                &format!("expected 'struct' keyword, got: {}", quote(first_word(text))),
                self.line,
                column,
            )
        })?;
        let name_column = column + offset;
        let name_len = rest.find(|c: char| c == '{' || c == ' ' || c == '\t').unwrap_or(rest.len());
        let name = &rest[..name_len];
        let after_name = &rest[name_len..];
        let brace = after_name.trim_start_matches([' ', '\t']);
        let brace_column = name_column + name_len + (after_name.len() - brace.len());

        if name.is_empty() {
            return Err(error("expected struct name", self.line, name_column));
        }
        if !is_identifier(name) {
            return Err(error(
                &format!("incorrect name of struct: {}", quote(name)),
                self.line,
                name_column,
            ));
        }
        if !brace.starts_with('{') {
            return Err(error("expected opening curly brace", self.line, brace_column));
        }
        if is_reserved_struct_name(name) {
            return Err(SmeError::ReservedName(name.to_string()).at(self.line, name_column));
        }

        let package = self.current_package().to_string();
        self.compilation
            .registry_mut()
            .declare_struct(&package, name)
            .map_err(|e| e.at(self.line, name_column))?;
        self.current_struct = Some(name.to_string());

        // One-line bodies: `struct A { int32 x }`
        let body = brace[1..].trim_start_matches([' ', '\t']);
        if body.is_empty() {
            return Ok(ParserState::ReadingStructBody);
        }
        let body_column = brace_column + 1 + (brace.len() - 1 - body.len());
        self.state = ParserState::ReadingStructBody;
        self.read_struct_body(body, body_column)
    }

    fn read_struct_body(&mut self, text: &str, column: usize) -> Result<ParserState, SmeError> {
        self.expect_state(ParserState::ReadingStructBody);
        let (fields, closes) = match find_unquoted(text, "}") {
            None => (text, false),
            Some(pos) if pos == text.len() - 1 => (text[..pos].trim_end_matches([' ', '\t']), true),
            Some(pos) => {
                return Err(error(
                    "unexpected characters after closing curly brace",
                    self.line,
                    column + pos + 1,
                ))
            }
        };

        if !fields.is_empty() {
            self.read_fields(fields, column)?;
        }
        if closes {
            self.current_struct = None;
            Ok(ParserState::ReadingStructName)
        } else {
            Ok(ParserState::ReadingStructBody)
        }
    }

    fn read_fields(&mut self, text: &str, column: usize) -> Result<(), SmeError> {
        let decl = parse_field_declarations(text, self.line, column)?;
        let package = self.current_package().to_string();
        let strukt = self
            .current_struct
            .clone()
            .expect("a struct is always set while reading a struct body");

        let type_name = unwrap_type_name(&package, &decl.type_expr)
            .map_err(|e| e.at(self.line, decl.type_column))?;

        for field in &decl.fields {
            let field_type = self
                .compilation
                .resolve_canonical(&type_name, decl.is_optional, field.default.as_ref())
                .map_err(|e| e.at(self.line, field.column))?;
            self.compilation
                .registry_mut()
                .add_field_at(&package, &strukt, &field.name, field_type, self.line, field.column)
                .map_err(|e| e.at(self.line, field.column))?;
        }
        Ok(())
    }
}

/// Splits `keyword <rest>` into the trimmed rest and its byte offset in `text`.
fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<(&'a str, usize)> {
    let rest = text.strip_prefix(keyword)?;
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let trimmed = rest.trim_start_matches([' ', '\t']);
    Some((trimmed, text.len() - trimmed.len()))
}

fn first_word(text: &str) -> &str {
    text.split([' ', '\t']).next().unwrap_or(text)
}

fn is_reserved_struct_name(name: &str) -> bool {
    is_primitive_type_name(name) || name == "list" || name == "map" || KEYWORDS.contains(&name)
}
