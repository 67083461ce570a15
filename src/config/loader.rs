//! Configuration loader for memscan
//!
//! Handles loading configuration from TOML files and merging with defaults.

use super::defaults::default_config;
use crate::core::types::{Address, Tolerance};
use crate::memory::regions::EligibilityCriteria;
use crate::memory::scanner::ScanOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "memscan.toml";

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_scanner")]
    pub scanner: ScannerConfig,

    #[serde(default = "default_regions")]
    pub regions: RegionConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

/// Scanner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_float_tolerance")]
    pub float_tolerance: f32,
    #[serde(default = "default_double_tolerance")]
    pub double_tolerance: f64,
}

/// Region catalog and eligibility configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    #[serde(default = "default_maps_path")]
    pub maps_path: PathBuf,
    #[serde(default = "default_target_binary")]
    pub target_binary: String,
    #[serde(default = "default_heap_markers")]
    pub heap_markers: Vec<String>,
    #[serde(default = "default_arena_markers")]
    pub arena_markers: Vec<String>,
    #[serde(default = "default_anon_min_size")]
    pub anon_min_size: usize,
    #[serde(default = "default_anon_max_size")]
    pub anon_max_size: usize,
    /// Optional `[start, end]` window limiting every scan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_range: Option<(usize, usize)>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Config {
    /// Scanner options derived from `[scanner]`
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            chunk_size: self.scanner.chunk_size,
            max_results: self.scanner.max_results,
            tolerance: self.tolerance(),
        }
    }

    pub fn tolerance(&self) -> Tolerance {
        Tolerance {
            float: self.scanner.float_tolerance,
            double: self.scanner.double_tolerance,
        }
    }

    /// Eligibility criteria derived from `[regions]`
    pub fn eligibility(&self) -> EligibilityCriteria {
        EligibilityCriteria {
            target_binary: self.regions.target_binary.clone(),
            heap_markers: self.regions.heap_markers.clone(),
            arena_markers: self.regions.arena_markers.clone(),
            anon_min_size: self.regions.anon_min_size,
            anon_max_size: self.regions.anon_max_size,
            address_range: self
                .regions
                .address_range
                .map(|(start, end)| (Address::new(start), Address::new(end))),
        }
    }
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Loads configuration from file
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(
                self.config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads configuration, falling back to defaults only when the file is missing
    pub fn load_or_default(&self) -> Result<Config, ConfigError> {
        match self.load() {
            Err(ConfigError::FileNotFound(path)) => {
                debug!(%path, "no configuration file, using defaults");
                Ok(Config::default())
            }
            other => other,
        }
    }

    /// Saves configuration to file
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Loads and validates configuration from `path`, or from
/// [`DEFAULT_CONFIG_FILE`] when no path is given
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let loader = ConfigLoader::new(path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE)));
    let config = loader.load_or_default()?;
    super::validator::validate_config(&config)?;
    Ok(config)
}

// Default functions for serde
fn default_scanner() -> ScannerConfig {
    let defaults = default_config();
    ScannerConfig {
        chunk_size: defaults.scanner.chunk_size,
        max_results: defaults.scanner.max_results,
        float_tolerance: defaults.scanner.float_tolerance,
        double_tolerance: defaults.scanner.double_tolerance,
    }
}

fn default_regions() -> RegionConfig {
    let defaults = default_config();
    RegionConfig {
        maps_path: PathBuf::from(defaults.regions.maps_path),
        target_binary: defaults.regions.target_binary,
        heap_markers: defaults.regions.heap_markers,
        arena_markers: defaults.regions.arena_markers,
        anon_min_size: defaults.regions.anon_min_size,
        anon_max_size: defaults.regions.anon_max_size,
        address_range: None,
    }
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_config().logging.level,
    }
}

// Individual field defaults
fn default_chunk_size() -> usize {
    default_config().scanner.chunk_size
}

fn default_max_results() -> usize {
    default_config().scanner.max_results
}

fn default_float_tolerance() -> f32 {
    default_config().scanner.float_tolerance
}

fn default_double_tolerance() -> f64 {
    default_config().scanner.double_tolerance
}

fn default_maps_path() -> PathBuf {
    PathBuf::from(default_config().regions.maps_path)
}

fn default_target_binary() -> String {
    default_config().regions.target_binary
}

fn default_heap_markers() -> Vec<String> {
    default_config().regions.heap_markers
}

fn default_arena_markers() -> Vec<String> {
    default_config().regions.arena_markers
}

fn default_anon_min_size() -> usize {
    default_config().regions.anon_min_size
}

fn default_anon_max_size() -> usize {
    default_config().regions.anon_max_size
}

fn default_log_level() -> String {
    default_config().logging.level
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scanner: default_scanner(),
            regions: default_regions(),
            logging: default_logging(),
        }
    }
}
