//! Scan eligibility: which catalog regions are worth scanning
//!
//! Scanning every mapping (reserved arenas, shared read-only libraries,
//! guard pages) is slow and rarely finds mutable game state, so only
//! writable regions that look like the target's data are selected.

use crate::core::types::Address;
use crate::memory::regions::MemoryRegion;
use serde::{Deserialize, Serialize};

/// Criteria a region must meet to be scanned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityCriteria {
    /// Substring identifying the target binary's mappings; empty disables
    pub target_binary: String,
    /// Substrings identifying the process heap
    pub heap_markers: Vec<String>,
    /// Substrings identifying allocator arenas, eligible at any size
    pub arena_markers: Vec<String>,
    /// Anonymous regions must be strictly larger than this
    pub anon_min_size: usize,
    /// Anonymous regions must be strictly smaller than this
    pub anon_max_size: usize,
    /// Optional `[start, end)` window; regions are clipped to it
    pub address_range: Option<(Address, Address)>,
}

impl Default for EligibilityCriteria {
    fn default() -> Self {
        EligibilityCriteria {
            target_binary: "libminecraftpe".to_string(),
            heap_markers: vec!["[heap]".to_string()],
            arena_markers: vec![
                "[anon:libc_malloc]".to_string(),
                "[anon:scudo:".to_string(),
            ],
            anon_min_size: 4096,
            anon_max_size: 256 * 1024 * 1024,
            address_range: None,
        }
    }
}

impl EligibilityCriteria {
    /// Create criteria with the default heuristic
    pub fn new() -> Self {
        EligibilityCriteria::default()
    }

    /// Set the target binary name
    pub fn with_target_binary(mut self, name: impl Into<String>) -> Self {
        self.target_binary = name.into();
        self
    }

    /// Set the exclusive size bounds for anonymous regions
    pub fn with_anon_size_bounds(mut self, min: usize, max: usize) -> Self {
        self.anon_min_size = min;
        self.anon_max_size = max;
        self
    }

    /// Restrict scanning to `[start, end)`
    pub fn with_address_range(mut self, start: Address, end: Address) -> Self {
        self.address_range = Some((start, end));
        self
    }
}

/// Filter applying [`EligibilityCriteria`] to catalog regions
#[derive(Debug, Clone, Default)]
pub struct RegionFilter {
    criteria: EligibilityCriteria,
}

impl RegionFilter {
    /// Create a new region filter with the given criteria
    pub fn new(criteria: EligibilityCriteria) -> Self {
        RegionFilter { criteria }
    }

    pub fn criteria(&self) -> &EligibilityCriteria {
        &self.criteria
    }

    /// Check if a region passes the permission, name and size heuristic
    pub fn matches(&self, region: &MemoryRegion) -> bool {
        if !region.readable || !region.writable {
            return false;
        }

        let name = region.name.as_str();
        if !self.criteria.target_binary.is_empty() && name.contains(&self.criteria.target_binary) {
            return true;
        }
        if self.criteria.heap_markers.iter().any(|m| name.contains(m.as_str())) {
            return true;
        }
        if self.criteria.arena_markers.iter().any(|m| name.contains(m.as_str())) {
            return true;
        }
        if region.is_anonymous() {
            let size = region.size();
            return size > self.criteria.anon_min_size && size < self.criteria.anon_max_size;
        }

        false
    }

    /// Clips an eligible region to the configured address window
    fn clip(&self, region: &MemoryRegion) -> Option<MemoryRegion> {
        match self.criteria.address_range {
            None => Some(region.clone()),
            Some((low, high)) => {
                let start = region.start.max(low);
                let end = region.end.min(high);
                (start < end).then(|| MemoryRegion {
                    start,
                    end,
                    ..region.clone()
                })
            }
        }
    }

    /// Eligible regions, clipped to the address window, in catalog order
    pub fn apply(&self, regions: &[MemoryRegion]) -> Vec<MemoryRegion> {
        regions
            .iter()
            .filter(|region| self.matches(region))
            .filter_map(|region| self.clip(region))
            .collect()
    }

    /// Count regions that would be scanned
    pub fn count(&self, regions: &[MemoryRegion]) -> usize {
        self.apply(regions).len()
    }

    /// Total bytes that would be scanned
    pub fn total_size(&self, regions: &[MemoryRegion]) -> usize {
        self.apply(regions).iter().map(MemoryRegion::size).sum()
    }
}
