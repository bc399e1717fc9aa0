// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rivulet_core::RivuletError;
use rivulet_flux::{Flux, Processor};
use rivulet_parallel::ParallelFluxExt;
use rivulet_test_utils::{failing_flux, TestProbe};

#[test]
fn test_round_robin_splits_values_across_rails() {
    // Arrange
    let rail_0 = TestProbe::unbounded();
    let rail_1 = TestProbe::unbounded();
    let probes = vec![rail_0.clone(), rail_1.clone()];

    // Act
    Flux::from_iter(0..8u64)
        .parallel(2)
        .subscribe_each(|index| Box::new(probes[index].subscriber()));

    // Assert
    assert_eq!(rail_0.values(), vec![0, 2, 4, 6]);
    assert_eq!(rail_1.values(), vec![1, 3, 5, 7]);
    assert!(rail_0.is_completed());
    assert!(rail_1.is_completed());
}

#[test]
fn test_parallelism_reports_the_rail_count() {
    // Act
    let parallel = Flux::from_iter(0..4u64).parallel(3);

    // Assert
    assert_eq!(parallel.parallelism(), 3);
}

#[test]
fn test_parallel_auto_uses_at_least_one_rail() {
    // Act
    let parallel = Flux::from_iter(0..4u64).parallel_auto();

    // Assert
    assert!(parallel.parallelism() >= 1);
}

#[test]
fn test_error_is_broadcast_to_every_rail() {
    // Arrange
    let rail_0 = TestProbe::unbounded();
    let rail_1 = TestProbe::unbounded();
    let probes = vec![rail_0.clone(), rail_1.clone()];

    // Act
    failing_flux(vec![1, 2], RivuletError::source_error("boom"))
        .parallel(2)
        .subscribe_each(|index| Box::new(probes[index].subscriber()));

    // Assert
    assert!(rail_0.error().is_some());
    assert!(rail_1.error().is_some());
}

#[test]
fn test_cancelled_rail_is_skipped_by_the_dispatcher() {
    // Arrange
    let upstream: Processor<u64> = Processor::new();
    let rail_0 = TestProbe::unbounded();
    let rail_1 = TestProbe::unbounded();
    let probes = vec![rail_0.clone(), rail_1.clone()];
    upstream
        .flux()
        .parallel(2)
        .subscribe_each(|index| Box::new(probes[index].subscriber()));

    // Act
    upstream.push(0);
    upstream.push(1);
    rail_1.cancel();
    upstream.push(2);
    upstream.push(3);
    upstream.complete();

    // Assert: everything after the cancellation lands on the live rail.
    assert_eq!(rail_0.values(), vec![0, 2, 3]);
    assert_eq!(rail_1.values(), vec![1]);
    assert!(rail_0.is_completed());
}

#[test]
fn test_rail_map_transforms_on_the_rail() {
    // Arrange
    let rail_0 = TestProbe::unbounded();
    let rail_1 = TestProbe::unbounded();
    let probes = vec![rail_0.clone(), rail_1.clone()];

    // Act
    Flux::from_iter(0..6u64)
        .parallel(2)
        .map(|n| n * 10)
        .subscribe_each(|index| Box::new(probes[index].subscriber()));

    // Assert
    assert_eq!(rail_0.values(), vec![0, 20, 40]);
    assert_eq!(rail_1.values(), vec![10, 30, 50]);
}

#[test]
fn test_rail_filter_replenishes_dropped_demand() {
    // Arrange
    let merged = TestProbe::unbounded();

    // Act
    Flux::from_iter(0..20u64)
        .parallel(2)
        .filter(|n| n % 3 == 0)
        .sequential()
        .subscribe(merged.subscriber());

    // Assert
    let mut values = merged.values();
    values.sort_unstable();
    assert_eq!(values, vec![0, 3, 6, 9, 12, 15, 18]);
    assert!(merged.is_completed());
}

#[test]
fn test_sequential_merges_every_value_exactly_once() {
    // Arrange
    let merged = TestProbe::unbounded();

    // Act
    Flux::from_iter(0..100u64)
        .parallel(4)
        .sequential()
        .subscribe(merged.subscriber());

    // Assert
    let mut values = merged.values();
    values.sort_unstable();
    assert_eq!(values, (0..100).collect::<Vec<_>>());
    assert!(merged.is_completed());
}

#[test]
fn test_sequential_fails_as_soon_as_any_rail_fails() {
    // Arrange
    let merged = TestProbe::unbounded();

    // Act
    failing_flux(vec![1, 2, 3], RivuletError::source_error("boom"))
        .parallel(2)
        .sequential()
        .subscribe(merged.subscriber());

    // Assert
    assert!(merged.error().is_some());
}

#[test]
fn test_groups_exposes_one_group_per_rail() {
    // Arrange
    let outer = TestProbe::unbounded();

    // Act
    Flux::from_iter(0..8u64)
        .parallel(2)
        .groups()
        .subscribe(outer.subscriber());

    // Assert: the outer sequence is the fixed rail set.
    let groups = outer.values();
    assert_eq!(groups.len(), 2);
    assert!(outer.is_completed());
    assert_eq!(groups[0].key(), &0);
    assert_eq!(groups[1].key(), &1);

    let probe_0 = TestProbe::unbounded();
    groups[0].flux().subscribe(probe_0.subscriber());
    let probe_1 = TestProbe::unbounded();
    groups[1].flux().subscribe(probe_1.subscriber());
    assert_eq!(probe_0.values(), vec![0, 2, 4, 6]);
    assert_eq!(probe_1.values(), vec![1, 3, 5, 7]);
    assert!(probe_0.is_completed());
    assert!(probe_1.is_completed());
}
