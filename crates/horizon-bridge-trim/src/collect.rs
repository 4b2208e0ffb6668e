//! Used host component analysis.
//!
//! The bridge template declares every host component the framework knows
//! about. When the build only imports a handful of them, the rest can be
//! left out of the generated bridge. That is only safe when every import of
//! the framework package is a named import; a `require` or a namespace
//! import hides which components are used, so analysis gives up and the
//! full bridge is emitted.

use std::collections::BTreeSet;

use crate::case::{is_component_name, kebab_case};
use crate::error::UnresolvableDependency;
use crate::options::BridgeOptions;
use crate::snapshot::{DependencyKind, DependencySnapshot};

const TARGET: &str = "horizon_bridge_trim::collect";

/// The host components a build uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsedComponents {
    /// Kebab-cased host tags, sorted and deduplicated.
    Tags(BTreeSet<String>),
    /// Usage could not be determined; keep every component.
    Untrimmed,
}

impl UsedComponents {
    /// Returns `true` if the bridge can be trimmed.
    pub fn is_trimmed(&self) -> bool {
        matches!(self, Self::Tags(_))
    }

    /// The used tags, if known.
    pub fn tags(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Tags(tags) => Some(tags),
            Self::Untrimmed => None,
        }
    }

    /// Whether the bridge must emit `tag`.
    pub fn contains(&self, tag: &str) -> bool {
        match self {
            Self::Tags(tags) => tags.contains(tag),
            Self::Untrimmed => true,
        }
    }

    /// Filter the full list of bridge tags down to those that must be
    /// emitted, preserving the input order.
    pub fn retain<'a>(&self, all_tags: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        all_tags.into_iter().filter(|tag| self.contains(tag)).collect()
    }
}

/// Outcome of [`collect_used_components`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimAnalysis {
    /// Host components the bridge has to keep.
    pub used: UsedComponents,
    /// Warnings to surface in the build output.
    pub diagnostics: Vec<UnresolvableDependency>,
}

/// Determine which host components a build uses.
///
/// Never fails: an unanalyzable import produces a diagnostic and
/// [`UsedComponents::Untrimmed`].
pub fn collect_used_components(
    snapshot: &DependencySnapshot,
    options: &BridgeOptions,
) -> TrimAnalysis {
    match collect_imported_names(snapshot, &options.framework_package) {
        Ok(names) => {
            let tags = component_tags(names.iter().map(String::as_str));
            tracing::debug!(
                target: TARGET,
                imported = names.len(),
                components = tags.len(),
                "collected used components"
            );
            TrimAnalysis {
                used: UsedComponents::Tags(tags),
                diagnostics: Vec::new(),
            }
        }
        Err(diagnostic) => {
            tracing::warn!(target: TARGET, resource = diagnostic.resource(), "{diagnostic}");
            TrimAnalysis {
                used: UsedComponents::Untrimmed,
                diagnostics: vec![diagnostic],
            }
        }
    }
}

/// Every name imported from `package` across the script modules.
///
/// Stops at the first import that cannot be analyzed.
#[tracing::instrument(level = "trace", target = "horizon_bridge_trim::collect", skip(snapshot))]
pub fn collect_imported_names(
    snapshot: &DependencySnapshot,
    package: &str,
) -> Result<BTreeSet<String>, UnresolvableDependency> {
    let mut names = BTreeSet::new();

    for module in snapshot.javascript_modules() {
        for dependency in module.dependencies.iter().filter(|d| d.request == package) {
            match (dependency.kind, &dependency.id) {
                (DependencyKind::CommonJsRequire, _) => {
                    return Err(UnresolvableDependency::CommonJsRequire {
                        package: package.to_string(),
                        resource: module.resource.clone(),
                    });
                }
                (DependencyKind::HarmonyImportSpecifier, Some(id)) if !id.is_empty() => {
                    names.insert(id.clone());
                }
                // A missing or empty id is `import * as X`.
                (DependencyKind::HarmonyImportSpecifier, _) => {
                    return Err(UnresolvableDependency::NamespaceImport {
                        package: package.to_string(),
                        resource: module.resource.clone(),
                        local_name: dependency.name.clone().unwrap_or_else(|| "_".to_string()),
                    });
                }
                (DependencyKind::Other, _) => {}
            }
        }
    }

    Ok(names)
}

/// Map imported names to host tags, dropping non-component names.
pub fn component_tags<'a>(names: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    names
        .into_iter()
        .filter(|name| is_component_name(name))
        .map(kebab_case)
        .collect()
}
