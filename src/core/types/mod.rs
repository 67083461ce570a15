//! Core type definitions for memscan
//!
//! This module contains all fundamental types used throughout the engine,
//! including the address wrapper, typed values, comparison predicates,
//! the result set, and error types.

mod address;
mod error;
mod predicate;
mod results;
mod value;

// Re-export all public types
pub use address::Address;
pub use error::{MemoryError, MemoryResult};
pub use predicate::ComparisonType;
pub use results::{ResultSet, DEFAULT_MAX_RESULTS};
pub use value::{MemoryValue, Scalar, Tolerance, ValueKind};

// Common type aliases
pub type Pid = libc::pid_t;
