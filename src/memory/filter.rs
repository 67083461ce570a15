//! Narrowing a result set by re-reading each address

use crate::core::types::{Address, ComparisonType, ResultSet, Scalar, Tolerance};
use crate::memory::access::MemorySource;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sets at least this large are re-read on the rayon pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// Counters from one filter pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    pub examined: usize,
    pub unreadable: usize,
    pub kept: usize,
}

/// Re-applies a predicate to every stored address
#[derive(Debug, Clone, Copy)]
pub struct ResultFilter {
    tolerance: Tolerance,
    parallel_threshold: usize,
}

impl Default for ResultFilter {
    fn default() -> Self {
        ResultFilter::new(Tolerance::default())
    }
}

impl ResultFilter {
    pub fn new(tolerance: Tolerance) -> Self {
        ResultFilter {
            tolerance,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Set the size from which the pass runs in parallel; `usize::MAX` disables it
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    fn check<S, T>(
        &self,
        source: &S,
        address: Address,
        predicate: ComparisonType,
        operand: T,
        key: Option<u64>,
    ) -> Option<bool>
    where
        S: MemorySource,
        T: Scalar,
    {
        let mut current: T = source.read(address).ok()?;
        if let Some(key) = key {
            current = current.unmask(key);
        }
        Some(predicate.evaluate(current, operand, &self.tolerance))
    }

    /// Keeps the addresses whose current value satisfies `predicate` against
    /// `operand`, in their original order. Unreadable addresses are dropped.
    pub fn apply<S, T>(
        &self,
        source: &S,
        results: &mut ResultSet,
        predicate: ComparisonType,
        operand: T,
        key: Option<u64>,
    ) -> FilterStats
    where
        S: MemorySource,
        T: Scalar,
    {
        let examined = results.len();
        let verdicts: Vec<(Address, Option<bool>)> = if examined >= self.parallel_threshold {
            results
                .as_slice()
                .par_iter()
                .map(|&address| (address, self.check(source, address, predicate, operand, key)))
                .collect()
        } else {
            results
                .iter()
                .map(|&address| (address, self.check(source, address, predicate, operand, key)))
                .collect()
        };

        let unreadable = verdicts.iter().filter(|(_, verdict)| verdict.is_none()).count();
        let survivors: Vec<Address> = verdicts
            .into_iter()
            .filter_map(|(address, verdict)| (verdict == Some(true)).then_some(address))
            .collect();

        let stats = FilterStats {
            examined,
            unreadable,
            kept: survivors.len(),
        };
        results.replace(survivors);

        debug!(
            kind = T::KIND.name(),
            predicate = ?predicate,
            examined = stats.examined,
            unreadable = stats.unreadable,
            kept = stats.kept,
            "filter complete"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::scanner::tests::FakeMemory;
    use pretty_assertions::assert_eq;

    const BASE: usize = 0x20000;

    fn set_of(addresses: &[usize]) -> ResultSet {
        let mut results = ResultSet::default();
        for &address in addresses {
            results.push(Address::new(address));
        }
        results
    }

    fn addresses(results: &ResultSet) -> Vec<usize> {
        results.iter().map(|a| a.as_usize()).collect()
    }

    #[test]
    fn test_narrowing_after_change() {
        let memory = FakeMemory::new(BASE, 64);
        let (a, b, c) = (BASE, BASE + 4, BASE + 8);
        for address in [a, b, c] {
            memory.plant(address, 10i32);
        }
        memory.plant(b, 11i32);

        let filter = ResultFilter::default();
        let mut results = set_of(&[a, b, c]);
        filter.apply(&memory, &mut results, ComparisonType::NotEqual, 10i32, None);
        assert_eq!(addresses(&results), vec![b]);

        let mut results = set_of(&[a, b, c]);
        filter.apply(&memory, &mut results, ComparisonType::Equal, 10i32, None);
        assert_eq!(addresses(&results), vec![a, c]);
    }

    #[test]
    fn test_nan_dropped_by_equal_and_not_equal() {
        let memory = FakeMemory::new(BASE, 64);
        memory.plant(BASE, f32::NAN);
        memory.plant(BASE + 4, 100.5f32);
        memory.plant(BASE + 8, f64::NAN);
        memory.plant(BASE + 16, 100.5f64);
        let filter = ResultFilter::default();

        let mut results = set_of(&[BASE, BASE + 4]);
        filter.apply(&memory, &mut results, ComparisonType::NotEqual, 100.0f32, None);
        assert_eq!(addresses(&results), vec![BASE + 4]);
        let mut results = set_of(&[BASE, BASE + 4]);
        filter.apply(&memory, &mut results, ComparisonType::Equal, 100.0f32, None);
        assert!(results.is_empty());

        let mut results = set_of(&[BASE + 8, BASE + 16]);
        filter.apply(&memory, &mut results, ComparisonType::NotEqual, 100.0f64, None);
        assert_eq!(addresses(&results), vec![BASE + 16]);
        let mut results = set_of(&[BASE + 8, BASE + 16]);
        filter.apply(&memory, &mut results, ComparisonType::Equal, 100.0f64, None);
        assert!(results.is_empty());
    }

    #[test]
    fn test_relational_predicates() {
        let memory = FakeMemory::new(BASE, 64);
        for (i, value) in [5i16, 10, 15, 20].iter().enumerate() {
            memory.plant(BASE + i * 2, *value);
        }
        let all = [BASE, BASE + 2, BASE + 4, BASE + 6];
        let filter = ResultFilter::default();

        let cases = [
            (ComparisonType::Greater, vec![BASE + 4, BASE + 6]),
            (ComparisonType::Less, vec![BASE]),
            (ComparisonType::GreaterOrEqual, vec![BASE + 2, BASE + 4, BASE + 6]),
            (ComparisonType::LessOrEqual, vec![BASE, BASE + 2]),
        ];
        for (predicate, expected) in cases {
            let mut results = set_of(&all);
            filter.apply(&memory, &mut results, predicate, 10i16, None);
            assert_eq!(addresses(&results), expected, "{:?}", predicate);
        }
    }

    #[test]
    fn test_unreadable_addresses_dropped() {
        let mut memory = FakeMemory::new(BASE, 64);
        memory.holes.push((BASE + 16, BASE + 32));
        memory.plant(BASE, 1i64);
        memory.plant(BASE + 16, 1i64);

        let mut results = set_of(&[BASE, BASE + 16, BASE + 0x1000]);
        let stats =
            ResultFilter::default().apply(&memory, &mut results, ComparisonType::Equal, 1i64, None);
        assert_eq!(addresses(&results), vec![BASE]);
        assert_eq!(stats.unreadable, 2);
        assert_eq!(stats.kept, 1);
    }

    #[test]
    fn test_float_filter_uses_tolerance_and_key() {
        let key = 0x5555_5555u64;
        let memory = FakeMemory::new(BASE, 64);
        memory.plant(BASE, f32::from_bits(100.005f32.to_bits() ^ key as u32));
        memory.plant(BASE + 4, f32::from_bits(100.5f32.to_bits() ^ key as u32));

        let mut results = set_of(&[BASE, BASE + 4]);
        ResultFilter::default().apply(&memory, &mut results, ComparisonType::Equal, 100.0f32, Some(key));
        assert_eq!(addresses(&results), vec![BASE]);
    }

    #[test]
    fn test_parallel_pass_keeps_order() {
        let memory = FakeMemory::new(BASE, 4096);
        for i in 0..1024 {
            memory.plant(BASE + i * 4, (i % 3) as i32);
        }
        let all: Vec<usize> = (0..1024).map(|i| BASE + i * 4).collect();
        let expected: Vec<usize> = all.iter().copied().filter(|a| ((a - BASE) / 4) % 3 == 1).collect();

        let mut results = set_of(&all);
        let filter = ResultFilter::default().with_parallel_threshold(1);
        filter.apply(&memory, &mut results, ComparisonType::Equal, 1i32, None);
        assert_eq!(addresses(&results), expected);
    }

    #[test]
    fn test_filter_keeps_truncated_flag() {
        let memory = FakeMemory::new(BASE, 64);
        let mut results = ResultSet::bounded(2);
        results.push(Address::new(BASE));
        results.push(Address::new(BASE + 8));
        assert!(results.is_truncated());

        ResultFilter::default().apply(&memory, &mut results, ComparisonType::Equal, 0i8, None);
        assert_eq!(results.len(), 2);
        assert!(results.is_truncated());
    }
}
