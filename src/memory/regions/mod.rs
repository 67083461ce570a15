//! Memory region discovery and scan-eligibility selection
//!
//! The catalog mirrors the process maps file; the filter picks the subset
//! of catalog regions the scanner visits.

pub mod catalog;
pub mod enumerator;
pub mod filter;

pub use catalog::{RegionCatalog, SELF_MAPS};
pub use enumerator::{parse_maps, parse_maps_line, MemoryRegion};
pub use filter::{EligibilityCriteria, RegionFilter};
