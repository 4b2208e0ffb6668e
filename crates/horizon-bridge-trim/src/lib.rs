//! Build-time host component trimming for Horizon Bridge.
//!
//! The generated bridge template must declare every host component a page
//! can render. This crate inspects the bundler's dependency snapshot, finds
//! which components are imported from the framework package, and reports the
//! host tags the bridge has to keep.
//!
//! # Example
//!
//! ```
//! use horizon_bridge_trim::{
//!     collect_used_components, BridgeOptions, DependencyRecord, DependencySnapshot,
//!     ModuleRecord, UsedComponents,
//! };
//!
//! let snapshot = DependencySnapshot::new().with_module(
//!     ModuleRecord::javascript("src/pages/index.js")
//!         .with_dependency(DependencyRecord::named_import("@goji/core", "View"))
//!         .with_dependency(DependencyRecord::named_import("@goji/core", "CoverView"))
//!         .with_dependency(DependencyRecord::named_import("@goji/core", "render")),
//! );
//!
//! let analysis = collect_used_components(&snapshot, &BridgeOptions::default());
//! assert!(analysis.diagnostics.is_empty());
//! assert_eq!(
//!     analysis.used.retain(["view", "text", "cover-view"]),
//!     vec!["view", "cover-view"]
//! );
//! ```
#![warn(missing_docs)]

pub mod case;
pub mod collect;
mod error;
pub mod options;
pub mod snapshot;

pub use case::{is_component_name, kebab_case};
pub use collect::{
    collect_imported_names, collect_used_components, component_tags, TrimAnalysis,
    UsedComponents,
};
pub use error::{Result, TrimError, UnresolvableDependency};
pub use options::{minimize_for, BridgeOptions, Target};
pub use snapshot::{DependencyKind, DependencyRecord, DependencySnapshot, ModuleRecord};
