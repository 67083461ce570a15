//! Memory operations: region discovery, safe access, scanning and filtering
//!
//! Data flows from the region catalog through the chunked scanner into a
//! [`ResultSet`](crate::core::types::ResultSet), which the result filter
//! then narrows. All reads and writes go through [`MemorySource`].

pub mod access;
pub mod accessor;
pub mod filter;
pub mod regions;
pub mod scanner;

pub use access::{MemorySource, SafeAccess};
pub use accessor::TypedAccessor;
pub use filter::{FilterStats, ResultFilter};
pub use regions::{EligibilityCriteria, MemoryRegion, RegionCatalog, RegionFilter};
pub use scanner::{ChunkedScanner, ScanOptions, ScanStats};
