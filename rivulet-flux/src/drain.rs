// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Work-in-progress gate serializing signal delivery.
//!
//! `request`, `cancel` and producer-side pushes may arrive concurrently from
//! any thread, but deliveries to one subscriber must not interleave. Each
//! producer funnels all of them through a [`DrainGate`]: the first caller
//! becomes the drainer and keeps looping until every pass signalled in the
//! meantime has been absorbed; later callers just bump the missed count and
//! return.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Missed-count drain gate.
#[derive(Debug, Default)]
pub struct DrainGate(AtomicUsize);

impl DrainGate {
    /// Creates an idle gate.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    /// Signals a pass. Returns `true` if the caller became the drainer and
    /// must run the drain loop; `false` if an active drainer will pick the
    /// pass up.
    pub fn enter(&self) -> bool {
        self.0.fetch_add(1, Ordering::AcqRel) == 0
    }

    /// Claims the gate before any concurrent signal can, so that requests
    /// made from inside `on_subscribe` only accumulate until the caller runs
    /// the first drain loop itself.
    ///
    /// Returns `false` if the gate was already claimed.
    pub fn prime(&self) -> bool {
        self.0
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Retires `missed` passes after a drain iteration. Returns the number of
    /// passes that arrived during the iteration; the drainer loops until this
    /// reaches zero.
    pub fn exit(&self, missed: usize) -> usize {
        self.0.fetch_sub(missed, Ordering::AcqRel) - missed
    }
}
