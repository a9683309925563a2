//! Output settings, optionally loaded from a TOML file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for rendering ASTs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AstConfig {
    /// Spaces per indentation level in encoded JSON.
    pub indent: usize,
    /// Tracing filter directive used when `RUST_LOG` is unset.
    pub log: String,
}

impl Default for AstConfig {
    fn default() -> Self {
        Self {
            indent: 2,
            log: "hclast=info".to_string(),
        }
    }
}

impl AstConfig {
    /// Load settings from a TOML file. Missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}
