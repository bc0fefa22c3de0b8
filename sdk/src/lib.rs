//! sme
//!
//! Read-only surface of a compiled SME module for code generators.
//!
//! - Snapshot types (re-exported from the compiler)
//! - JSON export of a finished `Module`, optionally tagged with a target language

use serde::Serialize;

pub use sme_compiler::error::{Diagnostic, SmeError};
pub use sme_compiler::registry::{Field, Module, Package, Struct};
pub use sme_compiler::types::{DefaultValue, StructRef, TypeDescriptor, TypeKind};
pub use sme_compiler::{compile_schema, compile_sources};

/// A module as handed to a per-language emitter.
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_language: Option<&'a str>,
    pub module:          &'a Module,
}

impl<'a> Snapshot<'a> {
    pub fn new(module: &'a Module) -> Self {
        Snapshot { target_language: None, module }
    }

    pub fn for_language(module: &'a Module, target_language: &'a str) -> Self {
        Snapshot { target_language: Some(target_language), module }
    }

    pub fn to_json(&self) -> Result<String, SmeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Encode a module into a pretty-printed JSON string.
pub fn module_to_json(module: &Module) -> Result<String, SmeError> {
    Ok(serde_json::to_string_pretty(module)?)
}

pub mod error {
    pub use sme_compiler::error::{Diagnostic, SmeError};
}

pub mod schema {
    pub use sme_compiler::registry::{Field, Module, Package, Struct};
    pub use sme_compiler::types::{DefaultValue, StructRef, TypeDescriptor, TypeKind};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const SCHEMA: &str = "syntax 1.0.0
package shop
struct Order {
    list[Item] items
    optional string note = null
    uint32 count = 1
}
struct Item {
    string sku
}
";

    #[test]
    fn test_module_to_json() {
        let module = compile_schema(SCHEMA).unwrap();
        let json: Value = serde_json::from_str(&module_to_json(&module).unwrap()).unwrap();

        assert_eq!(json["syntax_version"], "1.0.0");
        let order = &json["packages"][0]["structs"][0];
        assert_eq!(order["name"], "Order");
        assert_eq!(order["id"], module.find_struct("shop", "Order").unwrap().id());

        let items = &order["fields"][0]["type"];
        assert_eq!(items["name"], "list[shop.Item]");
        assert_eq!(items["kind"], "list");
        assert_eq!(items["value"]["kind"], "user_defined");
        assert_eq!(items["value"]["target"]["name"], "Item");

        let note = &order["fields"][1]["type"];
        assert_eq!(note["is_optional"], true);
        assert_eq!(note["default"]["kind"], "null");

        let count = &order["fields"][2]["type"];
        assert_eq!(count["default"], serde_json::json!({ "kind": "uint", "value": 1 }));
    }

    #[test]
    fn test_snapshot_tags_language() {
        let module = compile_schema(SCHEMA).unwrap();
        let json: Value =
            serde_json::from_str(&Snapshot::for_language(&module, "go").to_json().unwrap()).unwrap();
        assert_eq!(json["target_language"], "go");
        assert_eq!(json["module"]["packages"][0]["name"], "shop");

        let json: Value = serde_json::from_str(&Snapshot::new(&module).to_json().unwrap()).unwrap();
        assert!(json.get("target_language").is_none());
    }
}
