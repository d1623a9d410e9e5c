//! Memory configuration for decoded tile bitmaps.
//!
//! Controls how many pages around the visible range stay decoded and how much
//! memory the bitmap pool may keep for reuse. Configuration can be loaded from
//! a JSON file, environment variables, or created programmatically.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Memory configuration for the tile cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Pages kept decoded on each side of the visible range
    pub pages_in_memory: usize,
    /// Free-buffer budget of the bitmap pool in megabytes
    pub pool_limit_mb: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            pages_in_memory: 2,
            pool_limit_mb: 64,
        }
    }
}

impl MemoryConfig {
    /// Creates a configuration with explicit values.
    pub fn new(pages_in_memory: usize, pool_limit_mb: usize) -> Self {
        Self {
            pages_in_memory,
            pool_limit_mb,
        }
    }

    /// Sets the number of pages kept decoded around the visible range.
    pub fn with_pages_in_memory(mut self, pages: usize) -> Self {
        self.pages_in_memory = pages;
        self
    }

    /// Sets the pool budget in megabytes.
    pub fn with_pool_limit_mb(mut self, mb: usize) -> Self {
        self.pool_limit_mb = mb;
        self
    }

    /// Pool budget in bytes.
    pub fn pool_limit_bytes(&self) -> usize {
        self.pool_limit_mb * 1024 * 1024
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DOCVIEW_PAGES_IN_MEMORY`: pages kept around the visible range (default: 2)
    /// - `DOCVIEW_POOL_LIMIT_MB`: bitmap pool budget in MB (default: 64)
    ///
    /// # Errors
    /// Returns an error if any environment variable contains an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(pages) = env_usize("DOCVIEW_PAGES_IN_MEMORY")? {
            config.pages_in_memory = pages;
        }
        if let Some(mb) = env_usize("DOCVIEW_POOL_LIMIT_MB")? {
            config.pool_limit_mb = mb;
        }

        Ok(config)
    }

    /// Loads configuration from a JSON file.
    ///
    /// Missing keys fall back to defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Saves configuration to a JSON file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

/// Reads a `usize` environment variable, `None` if unset.
pub fn env_usize(name: &str) -> Result<Option<usize>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(None),
    }
}

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid value for a configuration parameter
    #[error("Invalid value for configuration key: {0}")]
    InvalidValue(String),

    /// I/O error reading or writing a configuration file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed configuration file
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = MemoryConfig::default();
        assert_eq!(config.pages_in_memory, 2);
        assert_eq!(config.pool_limit_mb, 64);
        assert_eq!(config.pool_limit_bytes(), 64 * 1024 * 1024);
    }

    #[test]
    fn test_builder_methods() {
        let config = MemoryConfig::default()
            .with_pages_in_memory(5)
            .with_pool_limit_mb(128);
        assert_eq!(config, MemoryConfig::new(5, 128));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        let _guard = EnvGuard::new(&["DOCVIEW_PAGES_IN_MEMORY", "DOCVIEW_POOL_LIMIT_MB"]);

        env::set_var("DOCVIEW_PAGES_IN_MEMORY", "4");
        env::set_var("DOCVIEW_POOL_LIMIT_MB", "32");

        let config = MemoryConfig::from_env().unwrap();
        assert_eq!(config.pages_in_memory, 4);
        assert_eq!(config.pool_limit_mb, 32);
    }

    #[test]
    #[serial]
    fn test_from_env_partial() {
        let _guard = EnvGuard::new(&["DOCVIEW_PAGES_IN_MEMORY", "DOCVIEW_POOL_LIMIT_MB"]);

        env::remove_var("DOCVIEW_POOL_LIMIT_MB");
        env::set_var("DOCVIEW_PAGES_IN_MEMORY", "1");

        let config = MemoryConfig::from_env().unwrap();
        assert_eq!(config.pages_in_memory, 1);
        assert_eq!(config.pool_limit_mb, 64); // default
    }

    #[test]
    #[serial]
    fn test_from_env_invalid() {
        let _guard = EnvGuard::new(&["DOCVIEW_POOL_LIMIT_MB"]);

        env::set_var("DOCVIEW_POOL_LIMIT_MB", "lots");
        let result = MemoryConfig::from_env();
        assert!(matches!(result, Err(ConfigError::InvalidValue(key)) if key == "DOCVIEW_POOL_LIMIT_MB"));
    }

    // Helper to save and restore environment variables
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new(var_names: &[&str]) -> Self {
            let vars = var_names
                .iter()
                .map(|name| (name.to_string(), env::var(name).ok()))
                .collect();
            Self { vars }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (name, value) in &self.vars {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MemoryConfig = serde_json::from_str(r#"{ "pages_in_memory": 7 }"#).unwrap();
        assert_eq!(config.pages_in_memory, 7);
        assert_eq!(config.pool_limit_mb, 64);
    }

    #[test]
    fn test_malformed_json() {
        let result: Result<MemoryConfig, _> = serde_json::from_str("{ not json");
        assert!(result.is_err());
    }

    #[test]
    fn test_file_save_and_load() {
        let config_path = std::env::temp_dir().join("docview_memory_config_test.json");

        let config = MemoryConfig::new(3, 16);
        config.save_to_file(&config_path).unwrap();

        let loaded = MemoryConfig::from_file(&config_path).unwrap();
        assert_eq!(config, loaded);

        let _ = fs::remove_file(config_path);
    }

    #[test]
    fn test_missing_file() {
        let result = MemoryConfig::from_file("/definitely/not/here/docview.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
