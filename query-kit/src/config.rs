//! Router build configuration
//!
//! ```rust,ignore
//! use query_kit::{KitConfig, router_with_config};
//!
//! let config = KitConfig::default()
//!     .with_max_depth(8)
//!     .with_debug_logging(true);
//!
//! let api = router_with_config("api", definitions, &config)?;
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default limit on namespace nesting below the scope.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigValidationError {
    /// max_depth must be greater than 0
    #[error("max_depth must be greater than 0")]
    InvalidMaxDepth,
}

/// Settings applied while a router tree is walked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KitConfig {
    /// Maximum nesting of namespaces and leaves below the scope
    pub max_depth: usize,
    /// Reject segment names outside `[A-Za-z0-9_-]`
    pub validate_segments: bool,
    /// Log every registered accessor at `debug`
    pub debug_logging: bool,
}

impl Default for KitConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            validate_segments: true,
            debug_logging: false,
        }
    }
}

impl KitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum nesting depth
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enable or disable segment name validation
    #[must_use]
    pub fn with_segment_validation(mut self, enabled: bool) -> Self {
        self.validate_segments = enabled;
        self
    }

    /// Enable or disable per-accessor debug logging
    #[must_use]
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_depth == 0 {
            return Err(ConfigValidationError::InvalidMaxDepth);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = KitConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.validate_segments);
    }

    #[test]
    fn test_zero_depth_is_invalid() {
        let config = KitConfig::new().with_max_depth(0);
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidMaxDepth));
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: KitConfig = serde_json::from_str(r#"{"debug_logging": true}"#).unwrap();
        assert!(config.debug_logging);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.validate_segments);
    }
}
