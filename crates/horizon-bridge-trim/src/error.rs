//! Error and diagnostic types for component trimming.

use std::path::PathBuf;

/// Result type alias for trimming operations.
pub type Result<T> = std::result::Result<T, TrimError>;

/// Errors reading trimming inputs.
#[derive(Debug, thiserror::Error)]
pub enum TrimError {
    /// The dependency snapshot is not valid JSON of the expected shape.
    #[error("Invalid dependency snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// The bridge options file is not valid TOML of the expected shape.
    #[error("Invalid bridge options: {0}")]
    Options(#[from] toml::de::Error),

    /// File I/O error.
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl TrimError {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// An import of the framework package that cannot be analyzed statically.
///
/// Reported as a build warning. The build still succeeds, only with every
/// host component kept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnresolvableDependency {
    /// `require('<package>')` instead of an ES module import.
    #[error(
        "ES module imports are strongly recommended in {resource}; \
         '{package}' is required through CommonJS so bridge component trimming is disabled"
    )]
    CommonJsRequire {
        /// The framework package.
        package: String,
        /// The module that requires it.
        resource: String,
    },

    /// `import * as name from '<package>'`.
    #[error(
        "Should not use `import * as {local_name} from '{package}'` in {resource}; \
         bridge component trimming is disabled"
    )]
    NamespaceImport {
        /// The framework package.
        package: String,
        /// The module that imports it.
        resource: String,
        /// Local binding name, `_` if the bundler did not report one.
        local_name: String,
    },
}

impl UnresolvableDependency {
    /// The module that contains the offending import.
    pub fn resource(&self) -> &str {
        match self {
            Self::CommonJsRequire { resource, .. } | Self::NamespaceImport { resource, .. } => {
                resource
            }
        }
    }
}
