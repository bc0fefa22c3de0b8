use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    defaults::DefaultLiteral,
    error::{Diagnostic, SmeError},
    lines::{end_of_file_line, prepare_lines},
    parser::{declared_packages, LineParser},
    pool::TypePool,
    registry::{AstRegistry, Module},
    resolver::unwrap_type_name,
    types::TypeDescriptor,
    verifier::{unresolved_references, verify_registry},
};

/// State of one compilation: the registry being populated and the type pool
/// interning every descriptor its fields use.
#[derive(Debug, Default)]
pub struct Compilation {
    registry: AstRegistry,
    pool:     TypePool,
}

impl Compilation {
    pub fn new() -> Self {
        Compilation {
            registry: AstRegistry::new(),
            pool:     TypePool::new(),
        }
    }

    pub fn registry(&self) -> &AstRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AstRegistry {
        &mut self.registry
    }

    pub fn pool(&self) -> &TypePool {
        &self.pool
    }

    /// Resolves a type expression as written inside `package` to its interned descriptor.
    pub fn resolve_type(
        &mut self,
        package: &str,
        type_expr: &str,
        is_optional: bool,
        default: Option<&DefaultLiteral>,
    ) -> Result<Arc<TypeDescriptor>, SmeError> {
        let canonical = unwrap_type_name(package, type_expr)?;
        self.resolve_canonical(&canonical, is_optional, default)
    }

    pub(crate) fn resolve_canonical(
        &mut self,
        type_name: &str,
        is_optional: bool,
        default: Option<&DefaultLiteral>,
    ) -> Result<Arc<TypeDescriptor>, SmeError> {
        self.pool
            .get_or_create(&mut self.registry, type_name, is_optional, default)
    }

    /// Materializes `name` as a placeholder package that a later `package`
    /// line binds.
    pub fn reserve_package(&mut self, name: &str) {
        self.registry.add_package(name);
    }


    /// Parses one source file into the registry. Parsing stops at the first error.
    pub fn parse_source(&mut self, text: &str) -> Result<(), SmeError> {
        let mut parser = LineParser::new(self);
        for line in prepare_lines(text) {
            parser.parse_line(&line)?;
        }
        parser.finish(end_of_file_line(text))
    }

    /// Runs end-of-compilation verification and hands out the finished module.
    pub fn finish(self) -> Result<Module, Vec<SmeError>> {
        verify_registry(&self.registry)?;
        Ok(self.registry.into_module())
    }
}

/// Compile a single schema text into a `Module`.
/// Packages must be declared before they are referenced.
/// Returns the first error found; see [`compile_sources`] for every diagnostic.
pub fn compile_schema(text: &str) -> Result<Module, SmeError> {
    let mut compilation = Compilation::new();
    compilation.parse_source(text)?;
    if let Some(error) = unresolved_references(compilation.registry()).into_iter().next() {
        return Err(error);
    }
    Ok(compilation.registry.into_module())
}

/// Compile a batch of `(path, contents)` sources into one `Module`.
///
/// Before a file is parsed, the packages declared by the other files of the
/// batch are reserved, so structs may reference packages of any file. Within
/// one file packages are still declared top-down.
///
/// A failing file does not stop the batch: every file is parsed and every
/// diagnostic is returned. End-of-compilation verification only runs when all
/// files parsed cleanly.
pub fn compile_sources(sources: &[(PathBuf, String)]) -> Result<Module, Vec<Diagnostic>> {
    let declared: Vec<Vec<String>> = sources
        .iter()
        .map(|(_, text)| declared_packages(&prepare_lines(text)))
        .collect();

    let mut compilation = Compilation::new();
    let mut diagnostics = Vec::new();
    for (index, (path, text)) in sources.iter().enumerate() {
        for (other, names) in declared.iter().enumerate() {
            if other != index {
                names.iter().for_each(|name| compilation.reserve_package(name));
            }
        }
        match compilation.parse_source(text) {
            Ok(()) => info!(file = %path.display(), "compiled"),
            Err(error) => {
                warn!(file = %path.display(), %error, "compilation failed");
                diagnostics.push(Diagnostic::in_file(path, error));
            }
        }
    }
    if !diagnostics.is_empty() {
        return Err(diagnostics);
    }

    compilation
        .finish()
        .map_err(|errors| errors.into_iter().map(Diagnostic::global).collect())
}
