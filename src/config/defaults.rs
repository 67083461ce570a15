//! Default configuration values for memscan

use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub scanner: ScannerDefaults,
    pub regions: RegionDefaults,
    pub logging: LoggingDefaults,
}

/// Default scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerDefaults {
    pub chunk_size: usize,
    pub max_results: usize,
    pub float_tolerance: f32,
    pub double_tolerance: f64,
}

/// Default region selection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionDefaults {
    pub maps_path: String,
    pub target_binary: String,
    pub heap_markers: Vec<String>,
    pub arena_markers: Vec<String>,
    pub anon_min_size: usize,
    pub anon_max_size: usize,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        scanner: ScannerDefaults {
            chunk_size: 4096,
            max_results: 50_000,
            float_tolerance: 0.01,
            double_tolerance: 0.001,
        },
        regions: RegionDefaults {
            maps_path: "/proc/self/maps".to_string(),
            target_binary: "libminecraftpe".to_string(),
            heap_markers: vec!["[heap]".to_string()],
            arena_markers: vec![
                "[anon:libc_malloc]".to_string(),
                "[anon:scudo:".to_string(),
            ],
            anon_min_size: 4096,
            anon_max_size: 268_435_456, // 256 MiB
        },
        logging: LoggingDefaults {
            level: "info".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Tolerance, DEFAULT_MAX_RESULTS};
    use crate::memory::regions::EligibilityCriteria;

    #[test]
    fn test_scanner_defaults() {
        let config = default_config();
        assert_eq!(config.scanner.chunk_size, 4096);
        assert_eq!(config.scanner.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(config.scanner.float_tolerance, Tolerance::default().float);
        assert_eq!(config.scanner.double_tolerance, Tolerance::default().double);
    }

    #[test]
    fn test_region_defaults_match_criteria() {
        let config = default_config();
        let criteria = EligibilityCriteria::default();
        assert_eq!(config.regions.target_binary, criteria.target_binary);
        assert_eq!(config.regions.heap_markers, criteria.heap_markers);
        assert_eq!(config.regions.arena_markers, criteria.arena_markers);
        assert_eq!(config.regions.anon_min_size, criteria.anon_min_size);
        assert_eq!(config.regions.anon_max_size, criteria.anon_max_size);
    }

    #[test]
    fn test_serialization() {
        let config = default_config();
        let serialized = toml::to_string(&config).unwrap();
        assert!(serialized.contains("chunk_size"));
        assert!(serialized.contains("maps_path"));

        let deserialized: ConfigDefaults = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.regions.maps_path, config.regions.maps_path);
        assert_eq!(deserialized.scanner.max_results, config.scanner.max_results);
    }
}
