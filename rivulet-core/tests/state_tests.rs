// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rivulet_core::{LifecycleState, StateCell};

#[test]
fn test_starts_unsubscribed() {
    let cell = StateCell::new();
    assert_eq!(cell.get(), LifecycleState::Unsubscribed);
}

#[test]
fn test_activate_transitions_once() {
    let cell = StateCell::new();

    assert!(cell.activate());
    assert_eq!(cell.get(), LifecycleState::Active);

    // A second on_subscribe must be detectable.
    assert!(!cell.activate());
}

#[test]
fn test_terminate_is_exactly_once() {
    let cell = StateCell::new();
    cell.activate();

    assert!(cell.terminate());
    assert!(!cell.terminate());
    assert!(cell.is_terminated());
}

#[test]
fn test_terminate_from_unsubscribed_is_allowed() {
    // Sources like `empty` terminate at subscribe time.
    let cell = StateCell::new();

    assert!(cell.terminate());
    assert_eq!(cell.get(), LifecycleState::Terminated);
}

#[test]
fn test_activate_after_terminate_fails() {
    let cell = StateCell::new();
    cell.terminate();

    assert!(!cell.activate());
    assert!(cell.is_terminated());
}

#[test]
fn test_concurrent_terminate_has_single_winner() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let cell = Arc::new(StateCell::new());
    cell.activate();
    let winners = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cell = Arc::clone(&cell);
            let winners = Arc::clone(&winners);
            std::thread::spawn(move || {
                if cell.terminate() {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(winners.load(Ordering::SeqCst), 1);
}
