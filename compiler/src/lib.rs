//! sme-compiler
//!
//! This crate implements:
//!  1) A line-oriented parser for `.sme` schema files,
//!  2) A type pool interning every type descriptor by (canonical name, optionality, default),
//!  3) An AST registry of packages, structs and fields with forward-referenced structs,
//!  4) End-of-compilation verification of unresolved references,
//!  5) Error types (`SmeError`, `Diagnostic`).

pub mod error;
pub mod types;
pub mod identity;
pub mod utils;
pub mod lines;
pub mod fields;
pub mod defaults;
pub mod resolver;
pub mod registry;
pub mod pool;
pub mod parser;
pub mod verifier;
pub mod compiler;

pub use compiler::{compile_schema, compile_sources, Compilation};
pub use error::{Diagnostic, SmeError};
pub use registry::{Field, Module, Package, Struct};
pub use types::{DefaultValue, StructRef, TypeDescriptor, TypeKind};
