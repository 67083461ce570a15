//! The bounded, ordered set of candidate addresses

use super::Address;
use serde::{Deserialize, Serialize};

/// Hard cap on the number of addresses a search keeps
pub const DEFAULT_MAX_RESULTS: usize = 50_000;

/// Addresses found by the last search, narrowed by each filter.
///
/// Order is discovery order. Once `capacity` entries are held, further
/// pushes are refused and `truncated` is raised; the pass that hit the cap
/// stops there, so a truncated set may hold exactly `capacity` genuine hits
/// or be missing more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    addresses: Vec<Address>,
    capacity: usize,
    truncated: bool,
}

impl Default for ResultSet {
    fn default() -> Self {
        ResultSet::bounded(DEFAULT_MAX_RESULTS)
    }
}

impl ResultSet {
    /// Creates an empty set holding at most `capacity` addresses
    pub fn bounded(capacity: usize) -> Self {
        ResultSet {
            addresses: Vec::new(),
            capacity,
            truncated: false,
        }
    }

    /// Appends an address; returns `false` once the set is full
    pub fn push(&mut self, address: Address) -> bool {
        if self.is_full() {
            self.truncated = true;
            return false;
        }
        self.addresses.push(address);
        if self.is_full() {
            self.truncated = true;
        }
        true
    }

    /// Replaces the contents with filter survivors, keeping the cap
    pub fn replace(&mut self, mut survivors: Vec<Address>) {
        survivors.truncate(self.capacity);
        self.addresses = survivors;
    }

    /// Empties the set and resets the truncation flag
    pub fn clear(&mut self) {
        self.addresses.clear();
        self.truncated = false;
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.addresses.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records that a pass stopped at a cap tighter than the set's own
    pub(crate) fn mark_truncated(&mut self) {
        self.truncated = true;
    }

    /// Whether the last search stopped at the cap
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn as_slice(&self) -> &[Address] {
        &self.addresses
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.addresses.iter()
    }

    /// Returns up to `count` addresses starting at `offset`, clamped to the
    /// set; an out-of-range offset yields an empty slice, never an error
    pub fn page(&self, offset: usize, count: usize) -> &[Address] {
        let start = offset.min(self.addresses.len());
        let end = start.saturating_add(count).min(self.addresses.len());
        &self.addresses[start..end]
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Address;
    type IntoIter = std::slice::Iter<'a, Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.addresses.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn filled(count: usize) -> ResultSet {
        let mut set = ResultSet::default();
        for i in 0..count {
            set.push(Address::new(0x1000 + i * 4));
        }
        set
    }

    #[test]
    fn test_push_respects_capacity() {
        let mut set = ResultSet::bounded(2);
        assert!(set.push(Address::new(1)));
        assert!(!set.is_truncated());
        assert!(set.push(Address::new(2)));
        assert!(set.is_truncated());
        assert!(!set.push(Address::new(3)));
        assert_eq!(set.as_slice(), &[Address::new(1), Address::new(2)]);
    }

    #[test]
    fn test_clear_resets_flag() {
        let mut set = ResultSet::bounded(1);
        set.push(Address::new(1));
        assert!(set.is_truncated());
        set.clear();
        assert!(set.is_empty());
        assert!(!set.is_truncated());
    }

    #[test]
    fn test_replace_keeps_order() {
        let mut set = filled(5);
        let survivors = vec![set.as_slice()[1], set.as_slice()[3]];
        set.replace(survivors.clone());
        assert_eq!(set.as_slice(), survivors.as_slice());
    }

    #[test]
    fn test_page_clamping() {
        let set = filled(10);
        assert_eq!(set.page(0, 3).len(), 3);
        assert_eq!(set.page(8, 5), &set.as_slice()[8..]);
        assert!(set.page(10, 1).is_empty());
        assert!(set.page(usize::MAX, usize::MAX).is_empty());
        assert_eq!(set.page(2, usize::MAX).len(), 8);
    }

    proptest! {
        #[test]
        fn prop_page_never_exceeds_set(len in 0usize..200, offset in 0usize..400, count in 0usize..400) {
            let set = filled(len);
            let page = set.page(offset, count);
            let expected = if offset >= len { 0 } else { count.min(len - offset) };
            prop_assert_eq!(page.len(), expected);
            if expected > 0 {
                prop_assert_eq!(page[0], set.as_slice()[offset]);
            }
        }
    }
}
