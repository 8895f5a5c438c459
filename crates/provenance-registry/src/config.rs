//! Registry configuration.

use serde::{Deserialize, Serialize};

use provenance_core::MAX_CONTENT_PER_AUTHOR;

use crate::error::{RegistryError, Result};

/// Configuration for the registry.
///
/// Loadable from JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Whether `register` checks signatures with the configured verifier.
    pub verify_signatures: bool,
    /// Per-author quota. May be lowered, never raised above
    /// [`MAX_CONTENT_PER_AUTHOR`].
    pub max_content_per_author: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            verify_signatures: false,
            max_content_per_author: MAX_CONTENT_PER_AUTHOR,
        }
    }
}

impl RegistryConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RegistryError::InvalidParams(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_content_per_author == 0 || self.max_content_per_author > MAX_CONTENT_PER_AUTHOR {
            return Err(RegistryError::InvalidParams(format!(
                "max_content_per_author must be in 1..={}, got {}",
                MAX_CONTENT_PER_AUTHOR, self.max_content_per_author
            )));
        }
        Ok(())
    }
}
