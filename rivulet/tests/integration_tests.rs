// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::StreamExt;
use rivulet::prelude::*;
use rivulet_test_utils::TestProbe;

#[tokio::test]
async fn test_cold_pipeline_through_the_stream_bridge() {
    // Act
    let collected: Vec<_> = Flux::from_iter(1..=20u64)
        .filter(|n| n % 2 == 0)
        .map(|n| n * n)
        .buffer(3)
        .into_stream()
        .collect()
        .await;

    // Assert
    let batches: Vec<_> = collected
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .expect("unexpected stream error");
    assert_eq!(
        batches,
        vec![
            vec![4, 16, 36],
            vec![64, 100, 144],
            vec![196, 256, 324],
            vec![400],
        ]
    );
}

#[test]
fn test_ref_count_shares_one_upstream_between_subscribers() {
    // Arrange
    let connectable = Flux::from_iter(0..6u64).map(|n| n + 100).publish();
    let shared = connectable.ref_count(2);
    let first = TestProbe::unbounded();
    let second = TestProbe::unbounded();

    // Act: the second subscription reaches the threshold and connects.
    shared.subscribe(first.subscriber());
    assert!(first.values().is_empty());
    shared.subscribe(second.subscriber());

    // Assert
    let expected: Vec<_> = (100..106).collect();
    assert_eq!(first.values(), expected);
    assert_eq!(second.values(), expected);
    assert!(first.is_completed());
    assert!(second.is_completed());
}

#[test]
fn test_replay_catches_a_late_subscriber_up() {
    // Arrange
    let connectable = Flux::from_iter(1..=5u64).replay(ReplayConfig::all());
    let early = TestProbe::unbounded();
    connectable.flux().subscribe(early.subscriber());
    connectable.connect();

    // Act
    let late = TestProbe::unbounded();
    connectable.flux().subscribe(late.subscriber());

    // Assert
    assert_eq!(early.values(), vec![1, 2, 3, 4, 5]);
    assert_eq!(late.values(), vec![1, 2, 3, 4, 5]);
    assert!(late.is_completed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_rails_merge_back_into_the_stream_bridge() {
    // Arrange
    let scheduler = std::sync::Arc::new(TokioScheduler::new());

    // Act
    let collected: Vec<_> = Flux::from_iter(0..100u64)
        .parallel(4)
        .run_on(scheduler)
        .map(|n| n * 2)
        .sequential()
        .into_stream()
        .collect()
        .await;

    // Assert
    let mut values: Vec<_> = collected
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .expect("unexpected stream error");
    values.sort_unstable();
    assert_eq!(values, (0..100).map(|n| n * 2).collect::<Vec<_>>());
}

#[test]
fn test_errors_keep_their_category_across_crates() {
    // Arrange
    let probe: TestProbe<u64> = TestProbe::unbounded();
    let flux = Flux::from_iter(1..=3u64)
        .try_map(|n| {
            if n == 2 {
                Err(RivuletError::user_error(std::io::Error::other("bad value")))
            } else {
                Ok(n)
            }
        })
        .window(10);

    // Act
    let outer = TestProbe::unbounded();
    flux.subscribe(outer.subscriber());
    outer.values()[0].subscribe(probe.subscriber());

    // Assert: the user error reaches both the open window and the outer
    // sequence.
    assert!(matches!(probe.error(), Some(RivuletError::UserError(_))));
    assert!(matches!(outer.error(), Some(RivuletError::UserError(_))));
}
