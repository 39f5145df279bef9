//! Engine configuration via `exprvec.toml`
//!
//! Every field has a default, so an empty file (or no file) gives the
//! standard behaviour. Unknown keys are rejected so typos surface at load
//! time instead of silently falling back to defaults.

use exprvec_core::limits::{
    DEFAULT_FETCH_BATCH_SIZE, DEFAULT_MASK_WARNING_LIMIT, MIN_SIZE_FOR_RENORMALIZATION,
};
use exprvec_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "exprvec.toml";

/// Engine configuration loaded from `exprvec.toml`.
///
/// # Example
///
/// ```toml
/// min_size_for_renormalization = 4000
/// fetch_batch_size = 500
/// mask_warning_limit = 5
/// cache_enabled = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Quantile normalization runs only with strictly more vectors than this
    #[serde(default = "default_min_size_for_renormalization")]
    pub min_size_for_renormalization: usize,
    /// Probes per store fetch on the read path
    #[serde(default = "default_fetch_batch_size")]
    pub fetch_batch_size: usize,
    /// Mask length mismatches logged in detail per recomputation
    #[serde(default = "default_mask_warning_limit")]
    pub mask_warning_limit: usize,
    /// Serve and populate the derived vector cache
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
}

fn default_min_size_for_renormalization() -> usize {
    MIN_SIZE_FOR_RENORMALIZATION
}

fn default_fetch_batch_size() -> usize {
    DEFAULT_FETCH_BATCH_SIZE
}

fn default_mask_warning_limit() -> usize {
    DEFAULT_MASK_WARNING_LIMIT
}

fn default_cache_enabled() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_size_for_renormalization: default_min_size_for_renormalization(),
            fetch_batch_size: default_fetch_batch_size(),
            mask_warning_limit: default_mask_warning_limit(),
            cache_enabled: default_cache_enabled(),
        }
    }
}

impl EngineConfig {
    /// Check field values
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if `fetch_batch_size` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.fetch_batch_size == 0 {
            return Err(Error::config("fetch_batch_size must be greater than 0"));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# exprvec engine configuration
#
# Quantile normalization is applied only when an experiment has strictly
# more design-element vectors than this (and the data is neither count
# nor ratio data).
min_size_for_renormalization = 4000

# Number of probes sent to the vector store per fetch.
fetch_batch_size = 500

# Mask/data length mismatches logged in detail per recomputation; the
# rest are summarized in a single warning.
mask_warning_limit = 5

# Cache derived vectors per (experiment, gene).
cache_enabled = true
"#
    }

    /// Parse and validate config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: EngineConfig = toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
