use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::{
    error::SmeError,
    identity,
    types::{DefaultValue, StructRef, TypeDescriptor},
};

/// Finished snapshot of one compiled schema, handed to code generators.
#[derive(Debug, Serialize)]
pub struct Module {
    syntax_version: String,
    packages:       Vec<Package>,
}

impl Module {
    pub fn syntax_version(&self) -> &str {
        &self.syntax_version
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn find_struct(&self, package: &str, name: &str) -> Option<&Struct> {
        self.package(package).and_then(|p| p.find_struct(name))
    }

    /// Struct a user-defined type points at.
    pub fn resolve(&self, target: &StructRef) -> Option<&Struct> {
        self.find_struct(&target.package, &target.name)
    }
}

#[derive(Debug, Serialize)]
pub struct Package {
    name:     String,
    #[serde(skip)]
    declared: bool,
    structs:  Vec<Struct>,
}

impl Package {
    fn new(name: &str) -> Self {
        Package {
            name:     name.to_string(),
            declared: false,
            structs:  Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `false` while the package only exists as a forward-declaration placeholder.
    pub fn is_declared(&self) -> bool {
        self.declared
    }

    pub fn structs(&self) -> &[Struct] {
        &self.structs
    }

    pub fn find_struct(&self, name: &str) -> Option<&Struct> {
        self.structs.iter().find(|s| s.name == name)
    }

    fn find_struct_mut(&mut self, name: &str) -> Option<&mut Struct> {
        self.structs.iter_mut().find(|s| s.name == name)
    }
}

#[derive(Debug, Serialize)]
pub struct Struct {
    name:     String,
    package:  String,
    id:       u32,
    #[serde(skip)]
    declared: bool,
    fields:   Vec<Field>,
}

impl Struct {
    fn new(package: &str, name: &str) -> Self {
        Struct {
            name:     name.to_string(),
            package:  package.to_string(),
            id:       identity::struct_identity(package, name),
            declared: false,
            fields:   Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Stable identity derived from the package and struct names only.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// `false` while the struct has only been referenced by another field's type.
    pub fn is_declared(&self) -> bool {
        self.declared
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn to_ref(&self) -> StructRef {
        StructRef {
            package: self.package.clone(),
            name:    self.name.clone(),
            id:      self.id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Field {
    name:   String,
    #[serde(rename = "type")]
    type_:  Arc<TypeDescriptor>,
    line:   usize,
    column: usize,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &Arc<TypeDescriptor> {
        &self.type_
    }

    pub fn is_optional(&self) -> bool {
        self.type_.is_optional()
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.type_.default_value()
    }

    /// Source position of the field name, `(0, 0)` when added programmatically.
    pub fn position(&self) -> (usize, usize) {
        (self.line, self.column)
    }
}

/// Mutable package → struct → field tree populated while parsing.
#[derive(Debug, Default)]
pub struct AstRegistry {
    syntax_version: Option<String>,
    packages:       Vec<Package>,
}

impl AstRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the module syntax version.
    ///
    /// # Panics
    /// When called a second time on the same registry.
    pub fn init_module(&mut self, syntax_version: &str) {
        assert!(
            self.syntax_version.is_none(),
            "attempt to initialize the module twice (already at syntax {:?})",
            self.syntax_version
        );
        debug!(syntax_version, "module initialized");
        self.syntax_version = Some(syntax_version.to_string());
    }

    pub fn syntax_version(&self) -> Option<&str> {
        self.syntax_version.as_deref()
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }

    fn package_mut(&mut self, name: &str) -> Result<&mut Package, SmeError> {
        self.packages
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| SmeError::NoSuchPackage(name.to_string()))
    }

    /// Returns the package with this name and whether it already existed.
    /// A newly created package is an undeclared placeholder.
    pub fn add_package(&mut self, name: &str) -> (&mut Package, bool) {
        if let Some(index) = self.packages.iter().position(|p| p.name == name) {
            return (&mut self.packages[index], true);
        }
        debug!(package = name, "package added");
        self.packages.push(Package::new(name));
        let last = self.packages.len() - 1;
        (&mut self.packages[last], false)
    }

    /// Explicit `package` declaration. Binds a placeholder created by
    /// [`add_package`](Self::add_package), fails on a second declaration.
    ///
    /// Packages are kept in declaration order: a bound placeholder moves to the end.
    pub fn declare_package(&mut self, name: &str) -> Result<&mut Package, SmeError> {
        match self.packages.iter().position(|p| p.name == name) {
            Some(index) if self.packages[index].declared => {
                return Err(SmeError::PackageAlreadyExists(name.to_string()))
            }
            Some(index) => {
                let placeholder = self.packages.remove(index);
                self.packages.push(placeholder);
            }
            None => self.packages.push(Package::new(name)),
        }
        let last = self.packages.len() - 1;
        let package = &mut self.packages[last];
        package.declared = true;
        Ok(package)
    }

    /// Creates a referenced-only struct.
    pub fn add_struct(&mut self, package: &str, name: &str) -> Result<&mut Struct, SmeError> {
        let package_node = self.package_mut(package)?;
        if package_node.find_struct(name).is_some() {
            return Err(SmeError::StructAlreadyExists {
                package: package.to_string(),
                name:    name.to_string(),
            });
        }
        debug!(package, name, "struct added");
        package_node.structs.push(Struct::new(package, name));
        let last = package_node.structs.len() - 1;
        Ok(&mut package_node.structs[last])
    }

    /// Explicit `struct` declaration. Binds a referenced-only struct of the same
    /// name, fails if the struct was already declared. Structs are kept in
    /// declaration order, so a bound struct moves to the end of its package.
    pub fn declare_struct(&mut self, package: &str, name: &str) -> Result<&mut Struct, SmeError> {
        let package_node = self.package_mut(package)?;
        match package_node.structs.iter().position(|s| s.name == name) {
            Some(index) if package_node.structs[index].declared => {
                return Err(SmeError::StructAlreadyExists {
                    package: package.to_string(),
                    name:    name.to_string(),
                })
            }
            Some(index) => {
                let placeholder = package_node.structs.remove(index);
                package_node.structs.push(placeholder);
            }
            None => package_node.structs.push(Struct::new(package, name)),
        }
        debug!(package, name, "struct declared");
        let last = package_node.structs.len() - 1;
        let strukt = &mut package_node.structs[last];
        strukt.declared = true;
        Ok(strukt)
    }

    /// Reference to a struct, creating it as referenced-only when unknown.
    /// The package must already exist.
    pub fn reference_struct(&mut self, package: &str, name: &str) -> Result<StructRef, SmeError> {
        match self.add_struct(package, name) {
            Ok(strukt) => Ok(strukt.to_ref()),
            Err(SmeError::StructAlreadyExists { .. }) => {
                Ok(self.get_struct_node(package, name)?.to_ref())
            }
            Err(e) => Err(e),
        }
    }

    pub fn get_struct_node(&self, package: &str, name: &str) -> Result<&Struct, SmeError> {
        self.package(package)
            .ok_or_else(|| SmeError::NoSuchPackage(package.to_string()))?
            .find_struct(name)
            .ok_or_else(|| SmeError::NoSuchStruct {
                package: package.to_string(),
                name:    name.to_string(),
            })
    }

    pub fn add_field(
        &mut self,
        package: &str,
        strukt: &str,
        field: &str,
        field_type: Arc<TypeDescriptor>,
    ) -> Result<&Field, SmeError> {
        self.add_field_at(package, strukt, field, field_type, 0, 0)
    }

    pub(crate) fn add_field_at(
        &mut self,
        package: &str,
        strukt: &str,
        field: &str,
        field_type: Arc<TypeDescriptor>,
        line: usize,
        column: usize,
    ) -> Result<&Field, SmeError> {
        let struct_node = self
            .package_mut(package)?
            .find_struct_mut(strukt)
            .ok_or_else(|| SmeError::NoSuchStruct {
                package: package.to_string(),
                name:    strukt.to_string(),
            })?;
        if struct_node.field(field).is_some() {
            return Err(SmeError::FieldAlreadyExists {
                package: package.to_string(),
                strukt:  strukt.to_string(),
                field:   field.to_string(),
            });
        }
        debug!(package, strukt, field, type_name = field_type.name(), "field added");
        struct_node.fields.push(Field {
            name:   field.to_string(),
            type_:  field_type,
            line,
            column,
        });
        Ok(&struct_node.fields[struct_node.fields.len() - 1])
    }

    /// Structs that were referenced but never declared.
    pub fn unresolved_structs(&self) -> impl Iterator<Item = &Struct> {
        self.packages
            .iter()
            .flat_map(|p| p.structs.iter())
            .filter(|s| !s.declared)
    }

    /// Placeholder packages that never received their declaration.
    pub fn undeclared_packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter().filter(|p| !p.declared)
    }

    pub fn into_module(self) -> Module {
        Module {
            syntax_version: self.syntax_version.unwrap_or_default(),
            packages:       self.packages,
        }
    }
}

/// Identity of a struct node; see [`identity::struct_identity`].
pub fn struct_identity(strukt: &Struct) -> u32 {
    identity::struct_identity(&strukt.package, &strukt.name)
}
