// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rivulet_core::RivuletError;
use rivulet_flux::Flux;
use rivulet_test_utils::TestProbe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_transform_applies_once_at_assembly() {
    // Arrange
    let applications = Arc::new(AtomicUsize::new(0));

    // Act
    let flux = Flux::from_iter(1..=6)
        .transform({
            let applications = Arc::clone(&applications);
            move |flux| {
                applications.fetch_add(1, Ordering::AcqRel);
                Ok(flux.filter(|n| n % 2 == 0))
            }
        })
        .expect("transform should succeed");

    // Assert: applied exactly once, before any subscription.
    assert_eq!(applications.load(Ordering::Acquire), 1);

    let first = TestProbe::unbounded();
    flux.subscribe(first.subscriber());
    let second = TestProbe::unbounded();
    flux.subscribe(second.subscriber());

    assert_eq!(applications.load(Ordering::Acquire), 1);
    assert_eq!(first.values(), vec![2, 4, 6]);
    assert_eq!(second.values(), vec![2, 4, 6]);
}

#[test]
fn test_transform_error_surfaces_to_caller() {
    // Act
    let result = Flux::from_iter(1..=3)
        .transform(|_flux| -> rivulet_core::Result<Flux<i32>> {
            Err(RivuletError::source_error("bad transformation"))
        });

    // Assert
    assert!(result.is_err());
}

#[test]
fn test_compose_applies_once_per_subscriber() {
    // Arrange
    let applications = Arc::new(AtomicUsize::new(0));
    let flux = Flux::from_iter(1..=4).compose({
        let applications = Arc::clone(&applications);
        move |flux| {
            applications.fetch_add(1, Ordering::AcqRel);
            Ok(flux.map(|n| n * 2))
        }
    });
    assert_eq!(applications.load(Ordering::Acquire), 0);

    // Act
    let first = TestProbe::unbounded();
    flux.subscribe(first.subscriber());
    let second = TestProbe::unbounded();
    flux.subscribe(second.subscriber());

    // Assert
    assert_eq!(applications.load(Ordering::Acquire), 2);
    assert_eq!(first.values(), vec![2, 4, 6, 8]);
    assert_eq!(second.values(), vec![2, 4, 6, 8]);
}

#[test]
fn test_compose_error_fails_the_subscriber() {
    // Arrange
    let flux = Flux::from_iter(1..=3).compose(|_flux| -> rivulet_core::Result<Flux<i32>> {
        Err(RivuletError::source_error("rebuild failed"))
    });
    let probe = TestProbe::unbounded();

    // Act
    flux.subscribe(probe.subscriber());

    // Assert
    assert!(probe.error().is_some());
    assert!(probe.values().is_empty());
}
