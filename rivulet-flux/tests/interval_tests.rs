// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rivulet_core::RivuletError;
use rivulet_flux::Flux;
use rivulet_runtime::TokioScheduler;
use rivulet_test_utils::TestProbe;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interval_ticks_monotonically() {
    // Arrange
    let scheduler = Arc::new(TokioScheduler::new());
    let probe = TestProbe::unbounded();

    // Act
    Flux::interval(Duration::from_millis(10), scheduler)
        .take(3)
        .subscribe(probe.subscriber());

    // Assert
    let probe_wait = probe.clone();
    tokio::task::spawn_blocking(move || {
        assert!(probe_wait.await_terminal(Duration::from_secs(5)));
    })
    .await
    .expect("wait task panicked");
    assert_eq!(probe.values(), vec![0, 1, 2]);
    assert!(probe.is_completed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tick_without_demand_is_an_overflow_error() {
    // Arrange: demand for a single tick only.
    let scheduler = Arc::new(TokioScheduler::new());
    let probe = TestProbe::with_request(1);

    // Act
    Flux::interval(Duration::from_millis(10), scheduler).subscribe(probe.subscriber());

    // Assert: the second tick fires with zero outstanding demand.
    let probe_wait = probe.clone();
    tokio::task::spawn_blocking(move || {
        assert!(probe_wait.await_terminal(Duration::from_secs(5)));
    })
    .await
    .expect("wait task panicked");
    assert_eq!(probe.values(), vec![0]);
    assert!(matches!(
        probe.error(),
        Some(RivuletError::Overflow { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_stops_the_ticks() {
    // Arrange
    let scheduler = Arc::new(TokioScheduler::new());
    let probe = TestProbe::unbounded();
    Flux::interval(Duration::from_millis(10), scheduler).subscribe(probe.subscriber());

    // Act
    let probe_wait = probe.clone();
    tokio::task::spawn_blocking(move || {
        assert!(probe_wait.await_values(2, Duration::from_secs(5)));
    })
    .await
    .expect("wait task panicked");
    probe.cancel();
    let seen = probe.value_count();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Assert: at most one in-flight tick after cancellation, no terminal.
    assert!(probe.value_count() <= seen + 1);
    assert!(!probe.is_terminated());
}
