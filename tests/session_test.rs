//! Search, filter and access against real memory of the test process

mod common;

use common::{Arena, GuardPage};
use memscan::{Address, ComparisonType, MemoryError, MemoryValue, Scalar, ValueKind};
use pretty_assertions::assert_eq;

fn planted_search<T: Scalar>(value: T) {
    let arena = Arena::new(64 * 1024);
    let offsets = [0, T::WIDTH * 3, 4096, 64 * 1024 - T::WIDTH];
    for &offset in &offsets {
        arena.plant(offset, value);
    }

    let mut session = arena.session();
    let stats = session.search(value, None).unwrap();

    let expected: Vec<Address> = offsets.iter().map(|&o| arena.address(o)).collect();
    assert_eq!(session.results().as_slice(), expected.as_slice(), "{:?}", T::KIND);
    assert_eq!(stats.matches, offsets.len());
    assert!(!session.results().is_truncated());
    assert_eq!(session.search_kind(), Some(T::KIND));
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_planted_values_found_for_every_width() {
    planted_search(-77i8);
    planted_search(-30_000i16);
    planted_search(123_456_789i32);
    planted_search(-9_876_543_210_123i64);
    planted_search(1234.5f32);
    planted_search(-0.125f64);
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_search_value_dispatches_by_kind() {
    let arena = Arena::new(16 * 1024);
    arena.plant(40, 4242i16);
    let mut session = arena.session();

    let value = MemoryValue::parse(ValueKind::Word, "4242").unwrap();
    session.search_value(&value, None).unwrap();
    assert_eq!(session.results().as_slice(), &[arena.address(40)]);
    assert_eq!(session.search_kind(), Some(ValueKind::Word));
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_obfuscated_value_needs_key() {
    let key = 0x0BAD_F00D_1234_5678u64;
    let arena = Arena::new(16 * 1024);
    arena.plant(128, 5000i32 ^ key as i32);
    let mut session = arena.session();

    session.search(5000i32, Some(key)).unwrap();
    assert_eq!(session.results().as_slice(), &[arena.address(128)]);
    session.search(5000i32, None).unwrap();
    assert!(session.results().is_empty());

    arena.plant(256, 5000i64 ^ key as i64);
    session.search(5000i64, Some(key)).unwrap();
    assert_eq!(session.results().as_slice(), &[arena.address(256)]);
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_filter_narrowing() {
    let arena = Arena::new(16 * 1024);
    let (a, b, c) = (64, 1024, 8192);
    for offset in [a, b, c] {
        arena.plant(offset, 10i32);
    }

    let mut session = arena.session();
    session.search(10i32, None).unwrap();
    assert_eq!(session.results().len(), 3);

    assert!(session.write(arena.address(b), 11i32));
    session.filter(ComparisonType::NotEqual, 10i32, None).unwrap();
    assert_eq!(session.results().as_slice(), &[arena.address(b)]);

    session.search(10i32, None).unwrap();
    assert_eq!(session.results().len(), 2);
    session.search(11i32, None).unwrap();
    session.filter(ComparisonType::Greater, 10i32, None).unwrap();
    assert_eq!(session.results().as_slice(), &[arena.address(b)]);
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_filter_equal_keeps_unchanged() {
    let arena = Arena::new(16 * 1024);
    for offset in [8, 16, 24] {
        arena.plant(offset, 10i32);
    }
    let mut session = arena.session();
    session.search(10i32, None).unwrap();
    arena.plant(16, 11i32);

    let stats = session
        .filter_value(ComparisonType::Equal, &MemoryValue::Dword(10), None)
        .unwrap();
    assert_eq!(stats.kept, 2);
    assert_eq!(
        session.results().as_slice(),
        &[arena.address(8), arena.address(24)]
    );
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_float_filter_tolerance() {
    let arena = Arena::new(16 * 1024);
    arena.plant(0, 50.0f32);
    arena.plant(4, 50.0f32);
    let mut session = arena.session();
    session.search(50.0f32, None).unwrap();
    assert_eq!(session.results().len(), 2);

    arena.plant(0, 50.005f32);
    arena.plant(4, 50.5f32);
    session.filter(ComparisonType::Equal, 50.0f32, None).unwrap();
    assert_eq!(session.results().as_slice(), &[arena.address(0)]);
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_capacity_truncates() {
    let arena = Arena::new(256 * 1024);
    arena.fill(7i32);
    let mut session = arena.session();

    let stats = session.search(7i32, None).unwrap();
    assert_eq!(session.results().len(), 50_000);
    assert!(session.results().is_truncated());
    assert!(stats.truncated);
    assert_eq!(session.results().as_slice()[0], arena.address(0));
    assert_eq!(session.results().as_slice()[49_999], arena.address(49_999 * 4));

    session.clear_results();
    assert!(session.results().is_empty());
    assert!(!session.results().is_truncated());
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_fault_safety() {
    let arena = Arena::new(4096);
    let guard = GuardPage::new();
    let session = arena.session();

    let result = session.read_value(guard.address(), ValueKind::Qword);
    assert!(matches!(result, Err(MemoryError::ReadFailed { .. })));
    assert_eq!(session.read::<i32>(guard.address()), 0);
    assert!(!session.write(guard.address(), 1i32));
    assert!(session.read_value(Address::new(0x10), ValueKind::Byte).is_err());

    arena.plant(0, 99i64);
    assert_eq!(session.read::<i64>(arena.address(0)), 99);
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_pagination_clamps() {
    let arena = Arena::new(16 * 1024);
    for i in 0..10 {
        arena.plant(i * 8, 3i64);
    }
    let mut session = arena.session();
    session.search(3i64, None).unwrap();
    let results = session.results();
    assert_eq!(results.len(), 10);

    assert!(results.page(10, 5).is_empty());
    assert!(results.page(100, 5).is_empty());
    assert_eq!(results.page(8, 5), &[arena.address(64), arena.address(72)]);
    assert_eq!(results.page(0, 3).len(), 3);
}

fn round_trip<T: Scalar + PartialEq>(session: &memscan::Session, address: Address, values: [T; 4]) {
    for value in values {
        assert!(session.write(address, value), "{:?}", value);
        assert_eq!(session.read::<T>(address), value);
    }
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_read_write_round_trip_boundaries() {
    let arena = Arena::new(4096);
    let session = arena.session();
    let at = arena.address(64);

    round_trip(&session, at, [0i8, i8::MAX, i8::MIN, -1]);
    round_trip(&session, at, [0i16, i16::MAX, i16::MIN, -1]);
    round_trip(&session, at, [0i32, i32::MAX, i32::MIN, -1]);
    round_trip(&session, at, [0i64, i64::MAX, i64::MIN, -1]);
    round_trip(&session, at, [0f32, f32::MAX, f32::MIN, -1.0]);
    round_trip(&session, at, [0f64, f64::MAX, f64::MIN, -1.0]);

    session
        .write_value(at, &MemoryValue::Double(6.5))
        .unwrap();
    assert_eq!(
        session.read_value(at, ValueKind::Double).unwrap(),
        MemoryValue::Double(6.5)
    );
}
