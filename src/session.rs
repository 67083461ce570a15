//! One search-then-filter session over the calling process
//!
//! A [`Session`] owns the region catalog, the scanner's staging buffer and
//! the result set. It is opened with [`Session::init`] and stays usable
//! until [`Session::close`]; afterwards every fallible operation returns
//! [`MemoryError::SessionClosed`] and the infallible accessors yield zero
//! or `false`.

use crate::config::{validate_config, Config, ConfigResult};
use crate::core::types::{
    Address, ComparisonType, MemoryError, MemoryResult, MemoryValue, Pid, ResultSet, Scalar,
    ValueKind,
};
use crate::memory::access::{MemorySource, SafeAccess};
use crate::memory::accessor::TypedAccessor;
use crate::memory::filter::{FilterStats, ResultFilter};
use crate::memory::regions::{MemoryRegion, RegionCatalog, RegionFilter};
use crate::memory::scanner::{ChunkedScanner, ScanStats};
use tracing::{debug, info};

/// Search/filter state for the calling process
#[derive(Debug)]
pub struct Session {
    access: Option<SafeAccess>,
    catalog: RegionCatalog,
    region_filter: RegionFilter,
    scanner: ChunkedScanner,
    result_filter: ResultFilter,
    results: ResultSet,
    search_kind: Option<ValueKind>,
    config: Config,
}

impl Session {
    /// Captures the process identity, installs the fault handler and builds
    /// the region catalog.
    ///
    /// The configuration is validated first, so a hand-built `Config` gets
    /// the same checks as one read through `load_config`.
    pub fn init(config: Config) -> ConfigResult<Self> {
        validate_config(&config)?;
        Ok(Session::build(config))
    }

    /// Opens a session with the default configuration
    pub fn open() -> Self {
        Session::build(Config::default())
    }

    fn build(config: Config) -> Self {
        let access = SafeAccess::current();
        let mut catalog = RegionCatalog::new(&config.regions.maps_path);
        let regions = catalog.refresh();

        info!(pid = access.pid(), regions, "session opened");
        Session {
            access: Some(access),
            catalog,
            region_filter: RegionFilter::new(config.eligibility()),
            scanner: ChunkedScanner::new(&config.scan_options()),
            result_filter: ResultFilter::new(config.tolerance()),
            results: ResultSet::bounded(config.scanner.max_results),
            search_kind: None,
            config,
        }
    }

    pub fn is_open(&self) -> bool {
        self.access.is_some()
    }

    pub fn pid(&self) -> Option<Pid> {
        self.access.map(|access| access.pid())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The access path, or `SessionClosed`
    pub fn access(&self) -> MemoryResult<SafeAccess> {
        self.access.ok_or(MemoryError::SessionClosed)
    }

    /// Rebuilds the region catalog, returning the new region count
    pub fn refresh_regions(&mut self) -> MemoryResult<usize> {
        self.access()?;
        Ok(self.catalog.refresh())
    }

    pub fn region_count(&self) -> usize {
        self.catalog.count()
    }

    pub fn regions(&self) -> &[MemoryRegion] {
        self.catalog.regions()
    }

    /// Catalog regions the next search will visit
    pub fn eligible_regions(&self) -> Vec<MemoryRegion> {
        self.region_filter.apply(self.catalog.regions())
    }

    /// Replaces the result set with every eligible address holding `target`
    pub fn search<T: Scalar>(&mut self, target: T, key: Option<u64>) -> MemoryResult<ScanStats> {
        let access = self.access()?;
        let regions = self.eligible_regions();
        self.search_kind = Some(T::KIND);

        let stats = self
            .scanner
            .search(&access, &regions, target, key, &mut self.results);
        info!(
            kind = T::KIND.name(),
            matches = stats.matches,
            truncated = stats.truncated,
            "search finished"
        );
        Ok(stats)
    }

    /// Searches for a runtime-typed value
    pub fn search_value(&mut self, value: &MemoryValue, key: Option<u64>) -> MemoryResult<ScanStats> {
        match *value {
            MemoryValue::Byte(v) => self.search(v, key),
            MemoryValue::Word(v) => self.search(v, key),
            MemoryValue::Dword(v) => self.search(v, key),
            MemoryValue::Qword(v) => self.search(v, key),
            MemoryValue::Float(v) => self.search(v, key),
            MemoryValue::Double(v) => self.search(v, key),
        }
    }

    /// Keeps the results whose current `T` value satisfies `predicate`
    pub fn filter<T: Scalar>(
        &mut self,
        predicate: ComparisonType,
        operand: T,
        key: Option<u64>,
    ) -> MemoryResult<FilterStats> {
        let access = self.access()?;
        let stats = self
            .result_filter
            .apply(&access, &mut self.results, predicate, operand, key);
        info!(
            kind = T::KIND.name(),
            kept = stats.kept,
            examined = stats.examined,
            "filter finished"
        );
        Ok(stats)
    }

    /// Filters with a runtime-typed operand; its kind sets the read width
    pub fn filter_value(
        &mut self,
        predicate: ComparisonType,
        operand: &MemoryValue,
        key: Option<u64>,
    ) -> MemoryResult<FilterStats> {
        match *operand {
            MemoryValue::Byte(v) => self.filter(predicate, v, key),
            MemoryValue::Word(v) => self.filter(predicate, v, key),
            MemoryValue::Dword(v) => self.filter(predicate, v, key),
            MemoryValue::Qword(v) => self.filter(predicate, v, key),
            MemoryValue::Float(v) => self.filter(predicate, v, key),
            MemoryValue::Double(v) => self.filter(predicate, v, key),
        }
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn clear_results(&mut self) {
        self.results.clear();
        debug!("results cleared");
    }

    /// Kind of the most recent search, if any
    pub fn search_kind(&self) -> Option<ValueKind> {
        self.search_kind
    }

    /// Reads a `T`; zero when the session is closed or the read fails
    pub fn read<T: Scalar>(&self, address: Address) -> T {
        match &self.access {
            Some(access) => TypedAccessor::new(access).read(address),
            None => T::default(),
        }
    }

    /// Writes a `T`; `false` when the session is closed or the write fails
    pub fn write<T: Scalar>(&self, address: Address, value: T) -> bool {
        match &self.access {
            Some(access) => TypedAccessor::new(access).write(address, value),
            None => false,
        }
    }

    pub fn read_value(&self, address: Address, kind: ValueKind) -> MemoryResult<MemoryValue> {
        self.access()?.read_value(address, kind)
    }

    pub fn write_value(&self, address: Address, value: &MemoryValue) -> MemoryResult<()> {
        self.access()?.write_value(address, value)
    }

    /// Drops the results and catalog and forgets the process identity
    pub fn close(&mut self) {
        if self.access.take().is_some() {
            info!(results = self.results.len(), "session closed");
        }
        self.results.clear();
        self.catalog.clear();
        self.search_kind = None;
    }
}
