// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Small source builders shared by the workspace test suites.

use rivulet_core::{Result, RivuletError};
use rivulet_flux::Flux;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A cold range source that counts its subscriptions into `subscriptions`,
/// for asserting cold (once-per-subscriber) versus hot (once-ever)
/// evaluation.
#[must_use]
pub fn tracked_range(subscriptions: Arc<AtomicUsize>, range: std::ops::Range<u64>) -> Flux<u64> {
    Flux::defer(move || {
        subscriptions.fetch_add(1, Ordering::AcqRel);
        Ok(Flux::from_iter(range.clone()))
    })
}

/// A sequence that emits `values` and then fails with `error`.
#[must_use]
pub fn failing_flux<T>(values: Vec<T>, error: RivuletError) -> Flux<T>
where
    T: Clone + Send + Sync + 'static,
{
    let items: Vec<Result<T>> = values
        .into_iter()
        .map(Ok)
        .chain(std::iter::once(Err(error)))
        .collect();
    Flux::from_iter(items).try_map(|item| item)
}
