use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// CompilerConfig
///
/// Tunables for one `Compiler`. Every field has a default, so an empty TOML
/// document yields `CompilerConfig::default()`.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Deepest filter tree accepted; the root node is depth 1.
    pub max_depth: usize,

    /// Wrap LIKE / NOT_LIKE operands as `%value%`.
    pub wrap_like_pattern: bool,
}

impl CompilerConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            wrap_like_pattern: true,
        }
    }

    #[must_use]
    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub const fn wrap_like_pattern(mut self, wrap: bool) -> Self {
        self.wrap_like_pattern = wrap;
        self
    }

    /// Parse a flat TOML document such as `max_depth = 16`.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidMaxDepth);
        }

        Ok(())
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::new()
    }
}

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid compiler config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("max_depth must be at least 1")]
    InvalidMaxDepth,
}
