// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rivulet_core::RivuletError;
use rivulet_flux::{DrainGate, Processor};
use rivulet_test_utils::TestProbe;

#[test]
fn test_values_pushed_before_subscription_are_replayed() {
    // Arrange
    let processor = Processor::new();
    processor.push(1);
    processor.push(2);

    // Act
    let probe = TestProbe::unbounded();
    processor.subscribe(probe.subscriber());
    processor.push(3);
    processor.complete();

    // Assert
    assert_eq!(probe.values(), vec![1, 2, 3]);
    assert!(probe.is_completed());
}

#[test]
fn test_delivery_honors_demand() {
    // Arrange
    let processor = Processor::new();
    for n in 1..=5 {
        processor.push(n);
    }
    let probe = TestProbe::with_request(2);

    // Act
    processor.subscribe(probe.subscriber());

    // Assert
    assert_eq!(probe.values(), vec![1, 2]);
    assert_eq!(processor.queued(), 3);

    // Act
    probe.request(3);

    // Assert
    assert_eq!(probe.values(), vec![1, 2, 3, 4, 5]);
    assert_eq!(processor.emitted(), 5);
}

#[test]
fn test_completion_waits_for_queued_values() {
    // Arrange
    let processor = Processor::new();
    processor.push(1);
    processor.push(2);
    processor.complete();
    let probe = TestProbe::new();

    // Act
    processor.subscribe(probe.subscriber());

    // Assert: terminal is pending behind the queue.
    assert!(!probe.is_terminated());

    // Act
    probe.request(2);

    // Assert
    assert_eq!(probe.values(), vec![1, 2]);
    assert!(probe.is_completed());
}

#[test]
fn test_fail_discards_queued_values() {
    // Arrange
    let processor = Processor::new();
    processor.push(1);
    processor.fail(RivuletError::source_error("dropped"));
    let probe = TestProbe::new();

    // Act
    processor.subscribe(probe.subscriber());

    // Assert: the error arrives without any demand, queued values are gone.
    assert!(probe.error().is_some());
    assert!(probe.values().is_empty());
}

#[test]
fn test_second_subscriber_is_rejected() {
    // Arrange
    let processor: Processor<i32> = Processor::new();
    let first = TestProbe::unbounded();
    processor.subscribe(first.subscriber());

    // Act
    let second = TestProbe::unbounded();
    processor.subscribe(second.subscriber());

    // Assert
    let error = second.error().expect("expected rejection");
    assert!(error.is_violation());
    assert!(!first.is_terminated());
}

#[test]
fn test_signals_after_terminal_are_discarded() {
    // Arrange
    let processor = Processor::new();
    let probe = TestProbe::unbounded();
    processor.subscribe(probe.subscriber());

    // Act
    processor.push(1);
    processor.complete();
    processor.push(2);
    processor.fail(RivuletError::source_error("late"));

    // Assert
    assert_eq!(probe.values(), vec![1]);
    assert!(probe.is_completed());
}

#[test]
fn test_cancel_runs_hook_and_stops_delivery() {
    // Arrange
    let processor = Processor::new();
    let probe = TestProbe::with_request(1);
    let cancelled = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    {
        let cancelled = std::sync::Arc::clone(&cancelled);
        processor.set_on_cancel(move || {
            cancelled.store(true, std::sync::atomic::Ordering::Release);
        });
    }
    processor.subscribe(probe.subscriber());
    processor.push(1);

    // Act
    probe.cancel();
    processor.push(2);

    // Assert
    assert_eq!(probe.values(), vec![1]);
    assert!(cancelled.load(std::sync::atomic::Ordering::Acquire));
    assert!(processor.is_cancelled());
    assert!(!probe.is_terminated());
}

#[test]
fn test_gate_claim_is_denied_while_a_drain_is_in_flight() {
    // Arrange: an in-flight drain holds the gate.
    let gate = DrainGate::new();
    assert!(gate.enter());

    // Act + Assert: a concurrent claim is denied and must fall back to
    // signalling a normal pass.
    assert!(!gate.prime());
    assert!(!gate.enter());

    // The drainer retires its own pass, then absorbs the signalled one.
    assert_eq!(gate.exit(1), 1);
    assert_eq!(gate.exit(1), 0);

    // Idle again: a fresh claim succeeds.
    assert!(gate.prime());
}

#[test]
fn test_subscribe_concurrent_with_pushes_loses_nothing() {
    // Tight loop so subscription occasionally lands inside an in-flight
    // push's drain.
    for _ in 0..500 {
        // Arrange
        let processor = Processor::new();
        let probe = TestProbe::unbounded();
        let producer = {
            let processor = processor.clone();
            std::thread::spawn(move || {
                for n in 0..32 {
                    processor.push(n);
                }
            })
        };

        // Act
        processor.subscribe(probe.subscriber());
        producer.join().expect("producer thread panicked");
        processor.complete();

        // Assert: a single producer, so arrival order is push order.
        assert!(probe.await_terminal(std::time::Duration::from_secs(5)));
        assert_eq!(probe.values(), (0..32).collect::<Vec<i32>>());
    }
}

#[test]
fn test_concurrent_pushes_are_serialized() {
    // Arrange
    let processor = Processor::new();
    let probe = TestProbe::unbounded();
    processor.subscribe(probe.subscriber());

    // Act: hammer the processor from several threads.
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let processor = processor.clone();
            std::thread::spawn(move || {
                for n in 0..250 {
                    processor.push(t * 1000 + n);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("producer thread panicked");
    }
    processor.complete();

    // Assert: every value arrived exactly once.
    assert!(probe.await_terminal(std::time::Duration::from_secs(5)));
    let mut values = probe.values();
    values.sort_unstable();
    let mut expected: Vec<i32> = (0..4).flat_map(|t| (0..250).map(move |n| t * 1000 + n)).collect();
    expected.sort_unstable();
    assert_eq!(values, expected);
}
