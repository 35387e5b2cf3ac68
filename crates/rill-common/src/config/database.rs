//! Database configuration structures.
//!
//! These structures define the configurable aspects of a RillDB instance.
//! The page size and cache line size are compile-time constants and are not
//! configurable here.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::PAGE_SIZE;

/// Main database configuration.
///
/// # Example
///
/// ```rust
/// use rill_common::config::DbConfig;
///
/// let config = DbConfig::default();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Size of the buffer pool in bytes.
    ///
    /// The catalog core itself does not pin buffer pages, but the value is
    /// validated here and handed to the storage layer on open.
    pub buffer_pool_size: usize,

    /// Path to the init data file used when creating a database.
    ///
    /// When absent, the canonical init data generated from the bootstrap
    /// catalog is used instead.
    pub init_data_file: Option<PathBuf>,

    /// Keep temporary files and directories around after close. Tests only.
    pub keep_temps: bool,

    /// Suppress the database's own diagnostic log events.
    pub disable_logs: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            buffer_pool_size: 64 * 1024 * 1024,
            init_data_file: None,
            keep_temps: false,
            disable_logs: false,
        }
    }
}

impl DbConfig {
    /// Creates a configuration with the specified init data file.
    #[must_use]
    pub fn with_init_data_file(init_data_file: impl Into<PathBuf>) -> Self {
        Self {
            init_data_file: Some(init_data_file.into()),
            ..Default::default()
        }
    }

    /// Creates a minimal configuration for testing.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            buffer_pool_size: 4 * 1024 * 1024,
            init_data_file: None,
            keep_temps: false,
            disable_logs: true,
        }
    }

    /// Validates the configuration and returns an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_pool_size < PAGE_SIZE * 16 {
            return Err("buffer_pool_size must be at least 16 pages".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(DbConfig::default().validate().is_ok());
        assert!(DbConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_tiny_pool() {
        let config = DbConfig {
            buffer_pool_size: PAGE_SIZE,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = DbConfig::with_init_data_file("/tmp/init.dat");
        let json = serde_json::to_string(&config).unwrap();
        let back: DbConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.init_data_file, config.init_data_file);
        assert_eq!(back.buffer_pool_size, config.buffer_pool_size);
    }
}
