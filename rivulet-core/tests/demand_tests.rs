// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rivulet_core::demand::{self, UNBOUNDED};
use rivulet_core::Demand;

#[test]
fn test_requests_are_additive() {
    // Arrange
    let demand = Demand::new();

    // Act
    demand.add(3);
    demand.add(4);

    // Assert
    assert_eq!(demand.get(), 7);
}

#[test]
fn test_add_returns_previous_amount() {
    let demand = Demand::new();

    assert_eq!(demand.add(5), 0);
    assert_eq!(demand.add(2), 5);
}

#[test]
fn test_add_saturates_at_unbounded() {
    let demand = Demand::new();

    demand.add(u64::MAX - 1);
    demand.add(100);

    assert!(demand.is_unbounded());
}

#[test]
fn test_consume_decrements_bounded_demand() {
    let demand = Demand::new();
    demand.add(10);

    demand.consume(4);

    assert_eq!(demand.get(), 6);
}

#[test]
fn test_consume_floors_at_zero() {
    let demand = Demand::new();
    demand.add(2);

    demand.consume(5);

    assert_eq!(demand.get(), 0);
}

#[test]
fn test_unbounded_demand_is_never_consumed() {
    let demand = Demand::new();
    demand.add(UNBOUNDED);

    demand.consume(1_000_000);

    assert!(demand.is_unbounded());
}

#[test]
fn test_zero_request_is_a_violation() {
    let err = demand::validate(0).unwrap_err();
    assert!(err.is_violation());
}

#[test]
fn test_positive_request_is_valid() {
    assert!(demand::validate(1).is_ok());
    assert!(demand::validate(UNBOUNDED).is_ok());
}

#[test]
fn test_concurrent_adds_do_not_lose_demand() {
    use std::sync::Arc;

    let demand = Arc::new(Demand::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let demand = Arc::clone(&demand);
            std::thread::spawn(move || {
                for _ in 0..1_000 {
                    demand.add(1);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(demand.get(), 8_000);
}
