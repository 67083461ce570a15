//! Chunked value scanning over eligible regions
//!
//! Each region is streamed through a fixed-size staging buffer. Elements
//! are checked at width-aligned offsets inside a window only, so a value
//! straddling two windows is never seen.

use crate::core::types::{Address, ResultSet, Scalar, Tolerance, DEFAULT_MAX_RESULTS};
use crate::memory::access::MemorySource;
use crate::memory::regions::MemoryRegion;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Staging window size in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Options for memory scanning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Window size; a power of two no smaller than the widest element
    pub chunk_size: usize,
    /// Maximum results one search keeps, on top of the result set's own cap
    pub max_results: usize,
    /// Float equality bands
    pub tolerance: Tolerance,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_results: DEFAULT_MAX_RESULTS,
            tolerance: Tolerance::default(),
        }
    }
}

/// Counters from one search pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub regions_scanned: usize,
    pub windows_read: usize,
    pub windows_skipped: usize,
    pub matches: usize,
    pub truncated: bool,
}

/// Scanner owning the reusable staging buffer
#[derive(Debug, Clone)]
pub struct ChunkedScanner {
    buffer: Vec<u8>,
    max_results: usize,
    tolerance: Tolerance,
}

impl Default for ChunkedScanner {
    fn default() -> Self {
        ChunkedScanner::new(&ScanOptions::default())
    }
}

impl ChunkedScanner {
    /// Create a new scanner; chunk sizes below eight bytes are raised to
    /// eight and a zero result limit to one
    pub fn new(options: &ScanOptions) -> Self {
        ChunkedScanner {
            buffer: vec![0u8; options.chunk_size.max(8)],
            max_results: options.max_results.max(1),
            tolerance: options.tolerance,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.buffer.len()
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    /// Clears `results` and fills it with every aligned element of `regions`
    /// equal to `target` after un-XORing with `key`.
    ///
    /// Unreadable windows are skipped. The pass stops as soon as the set is
    /// full or holds `max_results` addresses, whichever comes first; either
    /// way the set is marked truncated.
    pub fn search<S, T>(
        &mut self,
        source: &S,
        regions: &[MemoryRegion],
        target: T,
        key: Option<u64>,
        results: &mut ResultSet,
    ) -> ScanStats
    where
        S: MemorySource,
        T: Scalar,
    {
        results.clear();
        let mut stats = ScanStats::default();
        let chunk = self.buffer.len();

        'regions: for region in regions {
            stats.regions_scanned += 1;
            let mut window_start = region.start;

            while window_start < region.end {
                let len = chunk.min(region.end.distance_from(window_start));
                let window = &mut self.buffer[..len];

                if let Err(err) = source.read_into(window_start, window) {
                    trace!(address = %window_start, error = %err, "window skipped");
                    stats.windows_skipped += 1;
                } else {
                    stats.windows_read += 1;
                    let mut offset = 0;
                    while offset + T::WIDTH <= len {
                        let mut value = T::from_ne_slice(&window[offset..offset + T::WIDTH]);
                        if let Some(key) = key {
                            value = value.unmask(key);
                        }
                        if value.approx_eq(target, &self.tolerance) {
                            let address = Address::new(window_start.as_usize() + offset);
                            if !results.push(address) || results.is_full() {
                                break 'regions;
                            }
                            if results.len() >= self.max_results {
                                results.mark_truncated();
                                break 'regions;
                            }
                        }
                        offset += T::WIDTH;
                    }
                }

                window_start = match window_start.checked_add(len) {
                    Some(next) => next,
                    None => break,
                };
            }
        }

        stats.matches = results.len();
        stats.truncated = results.is_truncated();
        debug!(
            kind = T::KIND.name(),
            regions = stats.regions_scanned,
            windows = stats.windows_read,
            skipped = stats.windows_skipped,
            matches = stats.matches,
            truncated = stats.truncated,
            "search complete"
        );
        stats
    }
}
