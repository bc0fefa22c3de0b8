use crate::{error::SmeError, registry::AstRegistry};

/// Every reference left dangling once all sources were parsed: structs that
/// were referenced but never declared, then placeholder packages that never
/// received their `package` line.
pub fn unresolved_references(registry: &AstRegistry) -> Vec<SmeError> {
    let structs = registry
        .unresolved_structs()
        .map(|s| SmeError::UnresolvedStruct {
            package: s.package().to_string(),
            name:    s.name().to_string(),
        });
    let packages = registry
        .undeclared_packages()
        .map(|p| SmeError::UnresolvedPackage(p.name().to_string()));
    structs.chain(packages).collect()
}

/// Returns `Ok(())` if every reference resolved, or every unresolved one otherwise.
pub fn verify_registry(registry: &AstRegistry) -> Result<(), Vec<SmeError>> {
    let errors = unresolved_references(registry);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
