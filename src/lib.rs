//! memscan: live memory search, filter and patch engine for Linux and Android

pub mod config;
pub mod core;
pub mod ffi;
pub mod memory;
pub mod session;
pub mod watchlist;

// Re-export main types from core module
pub use core::types::{
    Address, ComparisonType, MemoryError, MemoryResult, MemoryValue, Pid, ResultSet, Scalar,
    Tolerance, ValueKind, DEFAULT_MAX_RESULTS,
};

pub use config::{load_config, Config, ConfigError};
pub use memory::{
    EligibilityCriteria, MemoryRegion, MemorySource, RegionCatalog, SafeAccess, TypedAccessor,
};
pub use session::Session;
pub use watchlist::{WatchEntry, WatchList};
