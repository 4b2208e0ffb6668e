//! Bridge build options.
//!
//! Options are usually read from a `bridge.toml` next to the project
//! manifest. Every field has a default, so an empty file is valid:
//!
//! ```toml
//! target = "alipay"
//! max_depth = 12
//! minimize = false
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrimError};

/// Default nesting depth of generated bridge templates.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Directory the bridge files are written to.
pub const BRIDGE_OUTPUT_PATH: &str = "_goji";

/// Package whose named imports are host components.
pub const FRAMEWORK_PACKAGE: &str = "@goji/core";

/// Mini-program platform the bridge is generated for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// WeChat.
    #[default]
    Wechat,
    /// Baidu smart programs.
    Baidu,
    /// Alipay.
    Alipay,
    /// Toutiao / ByteDance.
    Toutiao,
    /// QQ.
    Qq,
}

impl Target {
    /// Name used in configuration and output paths.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wechat => "wechat",
            Self::Baidu => "baidu",
            Self::Alipay => "alipay",
            Self::Toutiao => "toutiao",
            Self::Qq => "qq",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for bridge generation and component trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeOptions {
    /// Maximum nesting depth of generated bridge templates.
    pub max_depth: usize,
    /// Target platform.
    pub target: Target,
    /// Whether to minimize bridge output.
    pub minimize: bool,
    /// Package whose imports are scanned for host components.
    pub framework_package: String,
    /// Output directory for bridge files.
    pub bridge_output_path: String,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            target: Target::default(),
            minimize: minimize_for(std::env::var("NODE_ENV").ok().as_deref()),
            framework_package: FRAMEWORK_PACKAGE.to_string(),
            bridge_output_path: BRIDGE_OUTPUT_PATH.to_string(),
        }
    }
}

impl BridgeOptions {
    /// Parse options from TOML. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let options = toml::from_str(source)?;
        Ok(options)
    }

    /// Read options from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| TrimError::io(path, e))?;
        Self::from_toml_str(&source)
    }
}

/// Default for [`BridgeOptions::minimize`] given the value of `NODE_ENV`.
///
/// Everything except a development build is minimized.
pub fn minimize_for(node_env: Option<&str>) -> bool {
    node_env != Some("development")
}
