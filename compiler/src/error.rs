use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error at line {line}, column {column}: {msg}")]
    ParseError {
        msg:    String,
        line:   usize,
        column: usize,
    },

    /// A registry or pool error raised while processing a particular source line.
    #[error("Error at line {line}, column {column}: {source}")]
    Located {
        line:   usize,
        column: usize,
        #[source]
        source: Box<SmeError>,
    },

    #[error("Package \"{0}\" is already declared")]
    PackageAlreadyExists(String),

    #[error("No such package \"{0}\"")]
    NoSuchPackage(String),

    #[error("Struct \"{package}.{name}\" is already declared")]
    StructAlreadyExists { package: String, name: String },

    #[error("No such struct \"{package}.{name}\"")]
    NoSuchStruct { package: String, name: String },

    #[error("Field \"{field}\" is already declared in struct \"{package}.{strukt}\"")]
    FieldAlreadyExists {
        package: String,
        strukt:  String,
        field:   String,
    },

    #[error("The name \"{0}\" is reserved")]
    ReservedName(String),

    #[error("Struct \"{package}.{name}\" is referenced but never declared")]
    UnresolvedStruct { package: String, name: String },

    #[error("Package \"{0}\" is referenced but never declared")]
    UnresolvedPackage(String),

    #[error("Unknown type \"{0}\"")]
    UnknownType(String),

    #[error("Invalid type expression \"{type_name}\": {msg}")]
    InvalidTypeExpression { type_name: String, msg: String },

    #[error("Invalid default value \"{value}\" for type \"{type_name}\": {msg}")]
    InvalidDefaultValue {
        type_name: String,
        value:     String,
        msg:       String,
    },

    #[error("Non-optional type \"{0}\" cannot hold null as default value")]
    NullDefaultOnRequired(String),

    #[error("Syntax version \"{found}\" does not match the module syntax version \"{expected}\"")]
    SyntaxVersionMismatch { expected: String, found: String },
}

impl SmeError {
    /// Attaches a source position, leaving already positioned errors untouched.
    pub fn at(self, line: usize, column: usize) -> SmeError {
        match self {
            SmeError::ParseError { .. } | SmeError::Located { .. } => self,
            other => SmeError::Located {
                line,
                column,
                source: Box::new(other),
            },
        }
    }

    /// Position of the error in its source file, if it has one.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            SmeError::ParseError { line, column, .. } | SmeError::Located { line, column, .. } => {
                Some((*line, *column))
            }
            _ => None,
        }
    }

    /// Strips the position wrapper, if any.
    pub fn root(&self) -> &SmeError {
        match self {
            SmeError::Located { source, .. } => source.root(),
            other => other,
        }
    }
}

/// An error paired with the source it was reported for. Errors found after
/// every file was read (unresolved references) carry no file.
#[derive(Debug)]
pub struct Diagnostic {
    pub file:  Option<PathBuf>,
    pub error: SmeError,
}

impl Diagnostic {
    pub fn in_file(file: impl Into<PathBuf>, error: SmeError) -> Self {
        Diagnostic { file: Some(file.into()), error }
    }

    pub fn global(error: SmeError) -> Self {
        Diagnostic { file: None, error }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}: {}", file.display(), self.error),
            None => write!(f, "{}", self.error),
        }
    }
}
