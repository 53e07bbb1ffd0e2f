//! Configuration for the resource cache.

use serde::{Deserialize, Serialize};

/// Capacities of the two cache tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of simultaneously open source files.
    pub max_open_files: usize,

    /// Maximum number of cached interpolation surfaces.
    pub max_surfaces: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_open_files: 10,
            max_surfaces: 100,
        }
    }
}

impl CacheConfig {
    pub fn new(max_open_files: usize, max_surfaces: usize) -> Self {
        Self {
            max_open_files,
            max_surfaces,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("GRIBINDEX_MAX_OPEN_FILES") {
            if let Ok(size) = val.parse() {
                config.max_open_files = size;
            }
        }

        if let Ok(val) = std::env::var("GRIBINDEX_MAX_SURFACES") {
            if let Ok(size) = val.parse() {
                config.max_surfaces = size;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_open_files == 0 {
            return Err("max_open_files must be > 0".to_string());
        }

        if self.max_surfaces == 0 {
            return Err("max_surfaces must be > 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.max_open_files, 10);
        assert_eq!(config.max_surfaces, 100);
    }

    #[test]
    fn test_config_validation() {
        let mut config = CacheConfig::default();
        assert!(config.validate().is_ok());

        config.max_open_files = 0;
        assert!(config.validate().is_err());

        config = CacheConfig::default();
        config.max_surfaces = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_capacities() {
        let config = CacheConfig::new(2, 5);
        assert_eq!(config.max_open_files, 2);
        assert_eq!(config.max_surfaces, 5);
        assert!(config.validate().is_ok());
    }
}
