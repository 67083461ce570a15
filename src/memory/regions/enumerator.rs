//! Memory region records and the maps-format line parser

use crate::core::types::Address;
use serde::{Deserialize, Serialize};

/// One line of a process memory map
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryRegion {
    /// First address of the mapping
    pub start: Address,
    /// One past the last address of the mapping
    pub end: Address,
    pub readable: bool,
    pub writable: bool,
    pub executable: bool,
    /// `s` in the fourth permission column
    pub shared: bool,
    /// Offset into the backing file
    pub offset: u64,
    /// `major:minor` of the backing device
    pub device: String,
    pub inode: u64,
    /// Backing path or pseudo-name (`[heap]`, `[anon:...]`), empty if anonymous
    pub name: String,
}

impl MemoryRegion {
    /// Size of the region in bytes
    pub fn size(&self) -> usize {
        self.end.distance_from(self.start)
    }

    /// Check if an address is within this region
    pub fn contains(&self, address: Address) -> bool {
        address >= self.start && address < self.end
    }

    /// True for mappings with no name or an `[anon:...]` tag
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty() || self.name.starts_with("[anon:")
    }

    /// Permission column as it appears in the maps file
    pub fn permissions(&self) -> String {
        let flag = |set: bool, c: char| if set { c } else { '-' };
        [
            flag(self.readable, 'r'),
            flag(self.writable, 'w'),
            flag(self.executable, 'x'),
            if self.shared { 's' } else { 'p' },
        ]
        .iter()
        .collect()
    }
}

/// Splits off the next whitespace-delimited field
fn next_field(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    match input.find(char::is_whitespace) {
        Some(end) => Some((&input[..end], &input[end..])),
        None => Some((input, "")),
    }
}

/// Parses one maps line: `start-end perms [offset dev inode [name]]`.
///
/// Only the range and permission columns are required. Returns `None` for
/// lines lacking them, for malformed hex, and for empty ranges.
pub fn parse_maps_line(line: &str) -> Option<MemoryRegion> {
    let line = line.trim_end_matches(|c| c == '\n' || c == '\r');
    let (range, rest) = next_field(line)?;
    let (perms, rest) = next_field(rest)?;

    let (start, end) = range.split_once('-')?;
    let start = usize::from_str_radix(start, 16).ok()?;
    let end = usize::from_str_radix(end, 16).ok()?;
    if start >= end {
        return None;
    }

    let perms = perms.as_bytes();
    let (offset, rest) = next_field(rest).unwrap_or(("", ""));
    let (device, rest) = next_field(rest).unwrap_or(("", ""));
    let (inode, rest) = next_field(rest).unwrap_or(("", ""));

    Some(MemoryRegion {
        start: Address::new(start),
        end: Address::new(end),
        readable: perms.first() == Some(&b'r'),
        writable: perms.get(1) == Some(&b'w'),
        executable: perms.get(2) == Some(&b'x'),
        shared: perms.get(3) == Some(&b's'),
        offset: u64::from_str_radix(offset, 16).unwrap_or(0),
        device: device.to_string(),
        inode: inode.parse().unwrap_or(0),
        name: rest.trim().to_string(),
    })
}

/// Parses maps text, keeping readable regions in file order
pub fn parse_maps(text: &str) -> Vec<MemoryRegion> {
    text.lines()
        .filter_map(parse_maps_line)
        .filter(|region| region.readable)
        .collect()
}
