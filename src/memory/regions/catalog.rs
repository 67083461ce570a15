//! Snapshot of the readable regions listed in a maps file

use crate::core::types::{Address, MemoryError, MemoryResult};
use crate::memory::regions::enumerator::{parse_maps_line, MemoryRegion};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default maps file for the calling process
pub const SELF_MAPS: &str = "/proc/self/maps";

/// Ordered list of readable regions, rebuilt on every refresh
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    source: PathBuf,
    regions: Vec<MemoryRegion>,
}

impl Default for RegionCatalog {
    fn default() -> Self {
        RegionCatalog::for_current_process()
    }
}

impl RegionCatalog {
    /// An empty catalog reading from `source` on refresh
    pub fn new(source: impl Into<PathBuf>) -> Self {
        RegionCatalog {
            source: source.into(),
            regions: Vec::new(),
        }
    }

    pub fn for_current_process() -> Self {
        RegionCatalog::new(SELF_MAPS)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Re-reads the maps file, replacing the catalog.
    ///
    /// An unreadable file leaves an empty catalog. Returns the new count.
    pub fn refresh(&mut self) -> usize {
        match self.try_refresh() {
            Ok(count) => count,
            Err(err) => {
                warn!(error = %err, "region catalog left empty");
                0
            }
        }
    }

    /// Like [`refresh`](Self::refresh), but reports an unopenable maps file
    /// as `RegionsUnavailable` after emptying the catalog
    pub fn try_refresh(&mut self) -> MemoryResult<usize> {
        match File::open(&self.source) {
            Ok(file) => Ok(self.refresh_from(BufReader::new(file))),
            Err(err) => {
                self.regions.clear();
                Err(MemoryError::RegionsUnavailable(format!(
                    "{}: {}",
                    self.source.display(),
                    err
                )))
            }
        }
    }

    /// Rebuilds the catalog from maps-format text.
    ///
    /// Lines are decoded lossily; unparsable and non-readable lines are
    /// skipped. A read error ends the pass with whatever was parsed so far.
    pub fn refresh_from<R: BufRead>(&mut self, mut reader: R) -> usize {
        let mut regions = Vec::new();
        let mut line = Vec::new();
        let mut skipped = 0usize;

        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "maps read interrupted");
                    break;
                }
            }
            let text = String::from_utf8_lossy(&line);
            match parse_maps_line(&text) {
                Some(region) if region.readable => regions.push(region),
                Some(_) => {}
                None if text.trim().is_empty() => {}
                None => skipped += 1,
            }
        }

        self.regions = regions;
        debug!(
            count = self.regions.len(),
            skipped,
            "region catalog refreshed"
        );
        self.regions.len()
    }

    pub fn count(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// Region containing `address`, if any
    pub fn find(&self, address: Address) -> Option<&MemoryRegion> {
        self.regions.iter().find(|region| region.contains(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use std::io::Write;

    const FIXTURE: &str = "\
00400000-00452000 r-xp 00000000 08:02 173521      /usr/bin/game
00651000-00652000 r--p 00051000 08:02 173521      /usr/bin/game
00652000-00655000 rw-p 00052000 08:02 173521      /usr/bin/game
00e03000-00e24000 rw-p 00000000 00:00 0           [heap]
7f0000000000-7f0000001000 ---p 00000000 00:00 0
not a maps line
7ffd1b5f0000-7ffd1b611000 rw-p 00000000 00:00 0   [stack]
";

    #[test]
    fn test_refresh_from_fixture() {
        let mut catalog = RegionCatalog::new("unused");
        let count = catalog.refresh_from(Cursor::new(FIXTURE));
        assert_eq!(count, 5);
        assert_eq!(catalog.count(), 5);
        assert_eq!(catalog.regions()[3].name, "[heap]");
        assert!(catalog.regions().iter().all(|r| r.readable));
    }

    #[test]
    fn test_refresh_replaces_previous_catalog() {
        let mut catalog = RegionCatalog::new("unused");
        catalog.refresh_from(Cursor::new(FIXTURE));
        let count = catalog.refresh_from(Cursor::new("1000-2000 rw-p 0 00:00 0\n"));
        assert_eq!(count, 1);
        assert_eq!(catalog.regions()[0].start, Address::new(0x1000));
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let mut bytes = b"1000-2000 rw-p 0 00:00 0 /tmp/\xff\xfe\n".to_vec();
        bytes.extend_from_slice(b"3000-4000 r--p 0 00:00 0\n");
        let mut catalog = RegionCatalog::new("unused");
        assert_eq!(catalog.refresh_from(Cursor::new(bytes)), 2);
        assert!(catalog.regions()[0].name.starts_with("/tmp/"));
    }

    #[test]
    fn test_missing_file_yields_empty_catalog() {
        let mut catalog = RegionCatalog::new("/nonexistent/maps");
        catalog.refresh_from(Cursor::new(FIXTURE));
        assert_eq!(catalog.refresh(), 0);
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_try_refresh_reports_unavailable_maps() {
        let mut catalog = RegionCatalog::new("/nonexistent/maps");
        catalog.refresh_from(Cursor::new(FIXTURE));
        let err = catalog.try_refresh().unwrap_err();
        assert!(matches!(
            err,
            MemoryError::RegionsUnavailable(ref msg) if msg.contains("/nonexistent/maps")
        ));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_refresh_from_file_is_stable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let mut catalog = RegionCatalog::new(file.path());
        let first = catalog.refresh();
        let snapshot = catalog.regions().to_vec();
        let second = catalog.refresh();
        assert_eq!(first, second);
        assert_eq!(snapshot, catalog.regions());
    }

    #[test]
    fn test_find() {
        let mut catalog = RegionCatalog::new("unused");
        catalog.refresh_from(Cursor::new(FIXTURE));
        let region = catalog.find(Address::new(0x00e10000)).unwrap();
        assert_eq!(region.name, "[heap]");
        assert!(catalog.find(Address::new(0x10)).is_none());
    }

    #[test]
    #[cfg_attr(miri, ignore = "procfs not available in Miri")]
    fn test_current_process_has_regions() {
        let mut catalog = RegionCatalog::for_current_process();
        assert!(catalog.refresh() > 0);
        let local = 0u64;
        assert!(catalog.find(Address::from(&local as *const u64)).is_some());
    }
}
