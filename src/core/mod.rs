//! Core module containing fundamental types and traits for memscan
//!
//! This module provides the foundational building blocks used throughout
//! the engine: address handling, typed values and their comparison rules,
//! the bounded result set, and error types.

pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    Address, ComparisonType, MemoryError, MemoryResult, MemoryValue, ResultSet, Scalar,
    Tolerance, ValueKind,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

// Platform verification at compile time
#[cfg(not(any(target_os = "linux", target_os = "android")))]
compile_error!("memscan only supports Linux and Android");
