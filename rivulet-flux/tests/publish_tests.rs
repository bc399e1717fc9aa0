// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rivulet_core::demand::UNBOUNDED;
use rivulet_core::RivuletError;
use rivulet_flux::{Flux, Processor};
use rivulet_test_utils::{failing_flux, tracked_range, TestProbe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_nothing_runs_before_connect() {
    // Arrange
    let subscriptions = Arc::new(AtomicUsize::new(0));
    let connectable = tracked_range(Arc::clone(&subscriptions), 0..5).publish();
    let probe = TestProbe::unbounded();

    // Act
    connectable.flux().subscribe(probe.subscriber());

    // Assert
    assert_eq!(subscriptions.load(Ordering::Acquire), 0);
    assert!(probe.values().is_empty());

    // Act
    let _connection = connectable.connect();

    // Assert
    assert_eq!(subscriptions.load(Ordering::Acquire), 1);
    assert_eq!(probe.values(), vec![0, 1, 2, 3, 4]);
    assert!(probe.is_completed());
}

#[test]
fn test_single_upstream_fans_out_to_all_subscribers() {
    // Arrange
    let subscriptions = Arc::new(AtomicUsize::new(0));
    let connectable = tracked_range(Arc::clone(&subscriptions), 0..4).publish();
    let first = TestProbe::unbounded();
    let second = TestProbe::unbounded();
    connectable.flux().subscribe(first.subscriber());
    connectable.flux().subscribe(second.subscriber());

    // Act
    let _connection = connectable.connect();

    // Assert: one upstream run, both subscribers served.
    assert_eq!(subscriptions.load(Ordering::Acquire), 1);
    assert_eq!(first.values(), vec![0, 1, 2, 3]);
    assert_eq!(second.values(), vec![0, 1, 2, 3]);
    assert!(first.is_completed());
    assert!(second.is_completed());
}

#[test]
fn test_slow_subscriber_buffers_in_its_slot() {
    // Arrange
    let connectable = Flux::from_iter(0..1000i64).publish();
    let fast = TestProbe::unbounded();
    let slow = TestProbe::with_request(10);
    connectable.flux().subscribe(fast.subscriber());
    connectable.flux().subscribe(slow.subscriber());

    // Act
    let _connection = connectable.connect();

    // Assert: the slow slot got its 10, the upstream paused at its prefetch
    // window instead of running to completion.
    assert_eq!(slow.value_count(), 10);
    assert!(!slow.is_terminated());
    assert!(fast.value_count() < 1000);

    // Act: release the slow subscriber.
    slow.request(UNBOUNDED);

    // Assert
    assert_eq!(slow.value_count(), 1000);
    assert_eq!(fast.value_count(), 1000);
    assert!(slow.is_completed());
    assert!(fast.is_completed());
}

#[test]
fn test_terminal_is_sticky_for_late_subscribers() {
    // Arrange
    let connectable = Flux::from_iter(0..3).publish();
    let early = TestProbe::unbounded();
    connectable.flux().subscribe(early.subscriber());
    let _connection = connectable.connect();
    assert!(early.is_completed());

    // Act: subscribe after the upstream terminated.
    let late = TestProbe::unbounded();
    connectable.flux().subscribe(late.subscriber());

    // Assert: completion only, no values.
    assert!(late.values().is_empty());
    assert!(late.is_completed());
}

#[test]
fn test_upstream_error_is_broadcast() {
    // Arrange
    let connectable =
        failing_flux(vec![1, 2], RivuletError::source_error("upstream died")).publish();
    let first = TestProbe::unbounded();
    let second = TestProbe::unbounded();
    connectable.flux().subscribe(first.subscriber());
    connectable.flux().subscribe(second.subscriber());

    // Act
    let _connection = connectable.connect();

    // Assert
    assert_eq!(first.values(), vec![1, 2]);
    assert_eq!(second.values(), vec![1, 2]);
    assert!(first.error().is_some());
    assert!(second.error().is_some());
}

#[test]
fn test_disconnect_stops_the_upstream_without_terminal() {
    // Arrange: a hot upstream driven by hand.
    let upstream: Processor<i32> = Processor::new();
    let connectable = upstream.flux().publish();
    let probe = TestProbe::unbounded();
    connectable.flux().subscribe(probe.subscriber());
    let connection = connectable.connect();

    upstream.push(1);
    assert_eq!(probe.values(), vec![1]);

    // Act
    connection.disconnect();
    upstream.push(2);

    // Assert: the subscriber saw nothing more and no terminal signal.
    assert_eq!(probe.values(), vec![1]);
    assert!(!probe.is_terminated());
    assert!(upstream.is_cancelled());
}

#[test]
fn test_connect_is_idempotent_while_connected() {
    // Arrange
    let subscriptions = Arc::new(AtomicUsize::new(0));
    let connectable = tracked_range(Arc::clone(&subscriptions), 0..100_000).publish();
    let probe = TestProbe::with_request(1);
    connectable.flux().subscribe(probe.subscriber());

    // Act
    let _first = connectable.connect();
    let _second = connectable.connect();

    // Assert
    assert_eq!(subscriptions.load(Ordering::Acquire), 1);
}
