// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rivulet_flux::Flux;
use rivulet_parallel::ParallelFluxExt;
use rivulet_runtime::TokioScheduler;
use rivulet_test_utils::TestProbe;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_run_on_delivers_every_rail_in_order() {
    // Arrange
    let scheduler = Arc::new(TokioScheduler::new());
    let rail_0 = TestProbe::unbounded();
    let rail_1 = TestProbe::unbounded();
    let probes = vec![rail_0.clone(), rail_1.clone()];

    // Act
    Flux::from_iter(0..20u64)
        .parallel(2)
        .run_on(scheduler)
        .subscribe_each(|index| Box::new(probes[index].subscriber()));

    // Assert: each rail's worker preserves that rail's signal order.
    for probe in [&rail_0, &rail_1] {
        let probe_wait = probe.clone();
        tokio::task::spawn_blocking(move || {
            assert!(probe_wait.await_terminal(Duration::from_secs(5)));
        })
        .await
        .expect("wait task panicked");
    }
    assert_eq!(rail_0.values(), (0..20).step_by(2).collect::<Vec<_>>());
    assert_eq!(rail_1.values(), (1..20).step_by(2).collect::<Vec<_>>());
    assert!(rail_0.is_completed());
    assert!(rail_1.is_completed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_run_on_then_sequential_keeps_every_value() {
    // Arrange
    let scheduler = Arc::new(TokioScheduler::new());
    let merged = TestProbe::unbounded();

    // Act
    Flux::from_iter(0..200u64)
        .parallel(4)
        .run_on(scheduler)
        .map(|n| n + 1)
        .sequential()
        .subscribe(merged.subscriber());

    // Assert
    let merged_wait = merged.clone();
    tokio::task::spawn_blocking(move || {
        assert!(merged_wait.await_terminal(Duration::from_secs(5)));
    })
    .await
    .expect("wait task panicked");
    let mut values = merged.values();
    values.sort_unstable();
    assert_eq!(values, (1..=200).collect::<Vec<_>>());
    assert!(merged.is_completed());
}
