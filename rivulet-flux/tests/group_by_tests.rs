// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rivulet_core::RivuletError;
use rivulet_flux::{Flux, Processor};
use rivulet_test_utils::{failing_flux, TestProbe};

#[test]
fn test_values_route_to_their_key_group() {
    // Arrange
    let outer = TestProbe::unbounded();

    // Act
    Flux::from_iter(0..10u64)
        .group_by(|n| n % 2)
        .subscribe(outer.subscriber());

    // Assert: one group per distinct key, emitted at first sighting.
    let groups = outer.values();
    assert_eq!(groups.len(), 2);
    assert_eq!(*groups[0].key(), 0);
    assert_eq!(*groups[1].key(), 1);

    let evens = TestProbe::unbounded();
    groups[0].flux().subscribe(evens.subscriber());
    let odds = TestProbe::unbounded();
    groups[1].flux().subscribe(odds.subscriber());

    assert_eq!(evens.values(), vec![0, 2, 4, 6, 8]);
    assert_eq!(odds.values(), vec![1, 3, 5, 7, 9]);
    assert!(evens.is_completed());
    assert!(odds.is_completed());
    assert!(outer.is_completed());
}

#[test]
fn test_groups_buffer_until_consumed() {
    // Arrange: subscribe to the groups only after the source finished.
    let outer = TestProbe::unbounded();
    Flux::from_iter(vec!["apple", "avocado", "banana", "blueberry"])
        .group_by(|s| s.as_bytes()[0])
        .subscribe(outer.subscriber());
    assert!(outer.is_completed());

    // Act
    let groups = outer.values();
    let a_group = TestProbe::unbounded();
    groups[0].flux().subscribe(a_group.subscriber());

    // Assert: nothing was lost while unconsumed.
    assert_eq!(a_group.values(), vec!["apple", "avocado"]);
    assert!(a_group.is_completed());
}

#[test]
fn test_group_by_with_owned_keys() {
    // Arrange
    let outer = TestProbe::unbounded();

    // Act
    Flux::from_iter(vec!["ant", "bee", "asp", "bat"])
        .group_by(|s| s[..1].to_owned())
        .subscribe(outer.subscriber());

    // Assert
    let groups = outer.values();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].key(), "a");
    assert_eq!(groups[1].key(), "b");
    let a_group = TestProbe::unbounded();
    groups[0].flux().subscribe(a_group.subscriber());
    assert_eq!(a_group.values(), vec!["ant", "asp"]);
    assert!(a_group.is_completed());
}

#[test]
fn test_cancelled_group_key_restarts_fresh() {
    // Arrange: a hot source so the cancellation happens mid-stream.
    let source: Processor<u64> = Processor::new();
    let outer = TestProbe::unbounded();
    source.flux().group_by(|n| n % 2).subscribe(outer.subscriber());

    source.push(0);
    let groups = outer.values();
    assert_eq!(groups.len(), 1);
    let first_even = TestProbe::unbounded();
    groups[0].flux().subscribe(first_even.subscriber());
    assert_eq!(first_even.values(), vec![0]);

    // Act: retire the key, then produce it again.
    first_even.cancel();
    source.push(2);

    // Assert: a fresh group for the same key was opened.
    let groups = outer.values();
    assert_eq!(groups.len(), 2);
    assert_eq!(*groups[1].key(), 0);
    let second_even = TestProbe::unbounded();
    groups[1].flux().subscribe(second_even.subscriber());
    assert_eq!(second_even.values(), vec![2]);
}

#[test]
fn test_upstream_error_fails_groups_and_outer() {
    // Arrange
    let outer = TestProbe::unbounded();

    // Act
    failing_flux(vec![1u64, 2], RivuletError::source_error("source died"))
        .group_by(|n| n % 2)
        .subscribe(outer.subscriber());

    // Assert
    assert!(outer.error().is_some());
    let groups = outer.values();
    assert_eq!(groups.len(), 2);
    for group in &groups {
        let probe = TestProbe::unbounded();
        group.flux().subscribe(probe.subscriber());
        assert!(probe.error().is_some());
    }
}

#[test]
fn test_cancelling_outer_cancels_upstream() {
    // Arrange
    let source: Processor<u64> = Processor::new();
    let outer = TestProbe::unbounded();
    source.flux().group_by(|n| n % 3).subscribe(outer.subscriber());

    // Act
    outer.cancel();

    // Assert
    assert!(source.is_cancelled());
}
