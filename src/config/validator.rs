//! Configuration validator for memscan
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{Config, ConfigError, LoggingConfig, RegionConfig, ScannerConfig};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_scanner(&config.scanner)?;
        Self::validate_regions(&config.regions)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    /// Validates scanner configuration
    fn validate_scanner(scanner: &ScannerConfig) -> Result<(), ConfigError> {
        // Windows must hold whole elements of every width
        if !scanner.chunk_size.is_power_of_two() || scanner.chunk_size < 8 {
            return Err(ConfigError::Invalid(
                "Chunk size must be a power of 2 of at least 8 bytes".to_string(),
            ));
        }

        if scanner.max_results == 0 {
            return Err(ConfigError::Invalid(
                "Maximum results must be at least 1".to_string(),
            ));
        }

        if !(scanner.float_tolerance.is_finite() && scanner.float_tolerance >= 0.0) {
            return Err(ConfigError::Invalid(
                "Float tolerance must be a non-negative number".to_string(),
            ));
        }

        if !(scanner.double_tolerance.is_finite() && scanner.double_tolerance >= 0.0) {
            return Err(ConfigError::Invalid(
                "Double tolerance must be a non-negative number".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates region configuration
    fn validate_regions(regions: &RegionConfig) -> Result<(), ConfigError> {
        if regions.maps_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "Maps path cannot be empty".to_string(),
            ));
        }

        if regions.anon_min_size >= regions.anon_max_size {
            return Err(ConfigError::Invalid(format!(
                "Anonymous region size bounds are empty: min {} >= max {}",
                regions.anon_min_size, regions.anon_max_size
            )));
        }

        if regions
            .heap_markers
            .iter()
            .chain(regions.arena_markers.iter())
            .any(String::is_empty)
        {
            return Err(ConfigError::Invalid(
                "Region markers cannot be empty strings".to_string(),
            ));
        }

        if let Some((start, end)) = regions.address_range {
            if start >= end {
                return Err(ConfigError::Invalid(format!(
                    "Address range is empty: 0x{:X}..0x{:X}",
                    start, end
                )));
            }
        }

        Ok(())
    }

    /// Validates logging configuration
    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, valid_levels
            )));
        }

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}
