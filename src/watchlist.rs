//! Saved addresses with optional frozen values
//!
//! A watch list is the user's set of addresses worth keeping an eye on.
//! Frozen entries are rewritten with their stored value on every
//! [`WatchList::apply_frozen`] call. Lists persist as JSON.

use crate::core::types::{Address, MemoryError, MemoryResult, MemoryValue, ValueKind};
use crate::memory::access::MemorySource;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, trace};

/// Placeholder shown for an unreadable entry
pub const UNREADABLE: &str = "???";

/// Entry representing a single watched address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEntry {
    pub address: Address,
    pub kind: ValueKind,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub frozen: bool,
    /// Value written back while frozen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen_value: Option<MemoryValue>,
}

impl WatchEntry {
    /// Create a new, unfrozen entry
    pub fn new(address: Address, kind: ValueKind, label: impl Into<String>) -> Self {
        WatchEntry {
            address,
            kind,
            label: label.into(),
            frozen: false,
            frozen_value: None,
        }
    }

    /// Freezes the entry at `value`, which must match the entry's kind
    pub fn freeze(&mut self, value: MemoryValue) -> MemoryResult<()> {
        if value.kind() != self.kind {
            return Err(MemoryError::InvalidValueType(format!(
                "cannot freeze a {} entry with a {} value",
                self.kind,
                value.kind()
            )));
        }
        self.frozen = true;
        self.frozen_value = Some(value);
        Ok(())
    }

    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }
}

/// One row of [`WatchList::read_all`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchReading {
    pub address: Address,
    pub label: String,
    pub kind: ValueKind,
    /// Current value as text, or [`UNREADABLE`]
    pub value: String,
}

/// Ordered list of watched addresses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatchList {
    entries: Vec<WatchEntry>,
}

impl WatchList {
    pub fn new() -> Self {
        WatchList::default()
    }

    /// Adds an entry, replacing any existing entry at the same address
    pub fn add(&mut self, entry: WatchEntry) {
        match self.position(entry.address) {
            Some(index) => self.entries[index] = entry,
            None => self.entries.push(entry),
        }
    }

    /// Removes the entry at `address`, returning it
    pub fn remove(&mut self, address: Address) -> Option<WatchEntry> {
        self.position(address).map(|index| self.entries.remove(index))
    }

    /// Applies `change` to the entry at `address`; `false` if none exists
    pub fn update<F>(&mut self, address: Address, change: F) -> bool
    where
        F: FnOnce(&mut WatchEntry),
    {
        match self.entries.iter_mut().find(|entry| entry.address == address) {
            Some(entry) => {
                change(entry);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, address: Address) -> Option<&WatchEntry> {
        self.entries.iter().find(|entry| entry.address == address)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[WatchEntry] {
        &self.entries
    }

    fn position(&self, address: Address) -> Option<usize> {
        self.entries.iter().position(|entry| entry.address == address)
    }

    /// Current value of every entry, in list order
    pub fn read_all<S: MemorySource>(&self, source: &S) -> Vec<WatchReading> {
        self.entries
            .iter()
            .map(|entry| WatchReading {
                address: entry.address,
                label: entry.label.clone(),
                kind: entry.kind,
                value: source
                    .read_value(entry.address, entry.kind)
                    .map(|value| value.to_string())
                    .unwrap_or_else(|_| UNREADABLE.to_string()),
            })
            .collect()
    }

    /// Rewrites every frozen entry's value; returns how many writes succeeded
    pub fn apply_frozen<S: MemorySource>(&self, source: &S) -> usize {
        let mut written = 0;
        for entry in self.entries.iter().filter(|entry| entry.frozen) {
            let Some(value) = &entry.frozen_value else {
                continue;
            };
            match source.write_value(entry.address, value) {
                Ok(()) => written += 1,
                Err(err) => trace!(address = %entry.address, error = %err, "frozen write failed"),
            }
        }
        written
    }

    /// Saves the list as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> MemoryResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        debug!(path = %path.as_ref().display(), entries = self.len(), "watch list saved");
        Ok(())
    }

    /// Loads a list saved with [`WatchList::save`]
    pub fn load(path: impl AsRef<Path>) -> MemoryResult<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        let list: WatchList = serde_json::from_str(&json)?;
        debug!(path = %path.as_ref().display(), entries = list.len(), "watch list loaded");
        Ok(list)
    }
}
