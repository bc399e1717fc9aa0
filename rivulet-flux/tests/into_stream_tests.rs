// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::StreamExt;
use rivulet_core::RivuletError;
use rivulet_flux::Flux;
use rivulet_test_utils::failing_flux;

#[tokio::test]
async fn test_stream_yields_all_values_then_ends() {
    // Act
    let collected: Vec<_> = Flux::from_iter(1..=5).into_stream().collect().await;

    // Assert
    let values: Vec<_> = collected
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .expect("unexpected stream error");
    assert_eq!(values, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_stream_yields_the_error_last() {
    // Arrange
    let flux = failing_flux(vec![1, 2], RivuletError::source_error("boom"));

    // Act
    let collected: Vec<_> = flux.into_stream().collect().await;

    // Assert
    assert_eq!(collected.len(), 3);
    assert!(collected[0].is_ok());
    assert!(collected[1].is_ok());
    assert!(collected[2].is_err());
}

#[tokio::test]
async fn test_dropping_the_stream_cancels_the_subscription() {
    // Arrange: a source far larger than the bridge prefetch.
    let mut stream = Flux::from_iter(0..1_000_000u64).into_stream();

    // Act
    let first = stream.next().await;
    drop(stream);

    // Assert
    assert!(matches!(first, Some(Ok(0))));
}

#[tokio::test]
async fn test_stream_works_through_operators() {
    // Act
    let collected: Vec<_> = Flux::from_iter(1..=10)
        .filter(|n| n % 2 == 0)
        .map(|n| n * n)
        .into_stream()
        .collect()
        .await;

    // Assert
    let values: Vec<_> = collected
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .expect("unexpected stream error");
    assert_eq!(values, vec![4, 16, 36, 64, 100]);
}
