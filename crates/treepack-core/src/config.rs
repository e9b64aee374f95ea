//! Tree build configuration.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration for a single tree build.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct TreeConfig {
    /// Root directory to index.
    pub root: PathBuf,

    /// Honor the root's version-control ignore file.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub use_vcs_ignore: bool,

    /// Honor the user-defined custom ignore rules.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub use_custom_ignore: bool,

    /// Custom ignore rule text (gitignore syntax), one pattern per line.
    /// Blank lines and `#` comments are permitted and skipped.
    #[builder(default)]
    #[serde(default)]
    pub custom_rules: String,
}

fn default_true() -> bool {
    true
}

impl TreeConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        Ok(())
    }
}

impl TreeConfig {
    /// Create a new tree config builder.
    pub fn builder() -> TreeConfigBuilder {
        TreeConfigBuilder::default()
    }

    /// Create a simple config for indexing a path with both ignore
    /// sources enabled and no custom rules.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            use_vcs_ignore: true,
            use_custom_ignore: true,
            custom_rules: String::new(),
        }
    }
}
