//! Bundler dependency snapshot.
//!
//! The bundler exports its module graph as JSON. Only the fields used for
//! component analysis are modeled; unknown fields are ignored.
//!
//! ```json
//! {
//!   "modules": [
//!     {
//!       "type": "javascript/auto",
//!       "resource": "src/pages/index.js",
//!       "dependencies": [
//!         { "type": "harmony import specifier", "request": "@goji/core", "id": "View" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrimError};

/// Module type prefix of every analyzable script module.
pub const JAVASCRIPT_MODULE_PREFIX: &str = "javascript/";

/// Every module in a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySnapshot {
    /// Modules in bundler order.
    #[serde(default)]
    pub modules: Vec<ModuleRecord>,
}

impl DependencySnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a snapshot from JSON.
    pub fn from_json_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Read a snapshot from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| TrimError::io(path, e))?;
        Self::from_json_str(&source)
    }

    /// Add a module.
    pub fn with_module(mut self, module: ModuleRecord) -> Self {
        self.modules.push(module);
        self
    }

    /// Modules that hold script code.
    pub fn javascript_modules(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.iter().filter(|m| m.is_javascript())
    }
}

/// One module of the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    /// Module type, for example `javascript/auto` or `css/mini-extract`.
    #[serde(rename = "type")]
    pub module_type: String,
    /// Path of the source file.
    #[serde(default)]
    pub resource: String,
    /// Outgoing dependency edges, one per import use site.
    #[serde(default)]
    pub dependencies: Vec<DependencyRecord>,
}

impl ModuleRecord {
    /// Create a module with an explicit type.
    pub fn new(module_type: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            module_type: module_type.into(),
            resource: resource.into(),
            dependencies: Vec::new(),
        }
    }

    /// Create a `javascript/auto` module.
    pub fn javascript(resource: impl Into<String>) -> Self {
        Self::new("javascript/auto", resource)
    }

    /// Add a dependency.
    pub fn with_dependency(mut self, dependency: DependencyRecord) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Whether the module type is one of the `javascript/*` types.
    pub fn is_javascript(&self) -> bool {
        self.module_type.starts_with(JAVASCRIPT_MODULE_PREFIX)
    }
}

/// How a module refers to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    /// A use site of an ES module import binding.
    #[serde(rename = "harmony import specifier")]
    HarmonyImportSpecifier,
    /// A CommonJS `require` call.
    #[serde(rename = "cjs require")]
    CommonJsRequire,
    /// Any other dependency kind (side-effect imports, exports, contexts).
    #[serde(other, rename = "other")]
    Other,
}

/// One dependency edge of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Dependency type as reported by the bundler.
    #[serde(rename = "type")]
    pub kind: DependencyKind,
    /// The requested package or path.
    pub request: String,
    /// Imported export name, absent or empty for namespace imports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Local binding name, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DependencyRecord {
    /// `import { <id> } from '<request>'`.
    pub fn named_import(request: impl Into<String>, id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            kind: DependencyKind::HarmonyImportSpecifier,
            request: request.into(),
            name: Some(id.clone()),
            id: Some(id),
        }
    }

    /// `import * as <name> from '<request>'`.
    pub fn namespace_import(request: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: DependencyKind::HarmonyImportSpecifier,
            request: request.into(),
            id: None,
            name: Some(name.into()),
        }
    }

    /// `require('<request>')`.
    pub fn require(request: impl Into<String>) -> Self {
        Self {
            kind: DependencyKind::CommonJsRequire,
            request: request.into(),
            id: None,
            name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_snapshot() {
        let snapshot = DependencySnapshot::from_json_str(
            r#"{
                "modules": [
                    {
                        "type": "javascript/esm",
                        "resource": "src/app.js",
                        "size": 1024,
                        "dependencies": [
                            { "type": "harmony import specifier", "request": "@goji/core", "id": "View", "name": "View" },
                            { "type": "harmony side effect evaluation", "request": "./app.css" },
                            { "type": "cjs require", "request": "lodash" }
                        ]
                    },
                    { "type": "css/mini-extract", "resource": "src/app.css" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.modules.len(), 2);
        let deps = &snapshot.modules[0].dependencies;
        assert_eq!(deps[0], DependencyRecord::named_import("@goji/core", "View"));
        assert_eq!(deps[1].kind, DependencyKind::Other);
        assert_eq!(deps[2], DependencyRecord::require("lodash"));
        assert_eq!(snapshot.javascript_modules().count(), 1);
    }

    #[test]
    fn test_missing_modules_is_empty() {
        let snapshot = DependencySnapshot::from_json_str("{}").unwrap();
        assert!(snapshot.modules.is_empty());
    }

    #[test]
    fn test_malformed_snapshot() {
        let err = DependencySnapshot::from_json_str(r#"{ "modules": 3 }"#).unwrap_err();
        assert!(matches!(err, TrimError::Snapshot(_)));
    }

    #[test]
    fn test_module_type_prefix() {
        assert!(ModuleRecord::javascript("a.js").is_javascript());
        assert!(ModuleRecord::new("javascript/dynamic", "b.js").is_javascript());
        assert!(!ModuleRecord::new("json", "c.json").is_javascript());
        assert!(!ModuleRecord::new("asset/javascript", "d.js").is_javascript());
    }
}
