// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Per-subscription lifecycle state machine.
//!
//! Every subscription moves through `Unsubscribed -> Active -> Terminated`,
//! one-directionally. [`StateCell`] packs the machine into a single atomic so
//! the exactly-once terminal guarantee holds under concurrent signals, and
//! late signals arriving during race windows can be detected and discarded
//! instead of crashing the chain.

use std::sync::atomic::{AtomicU8, Ordering};

const UNSUBSCRIBED: u8 = 0;
const ACTIVE: u8 = 1;
const TERMINATED: u8 = 2;

/// Observable lifecycle state of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Created but `on_subscribe` has not been delivered yet.
    Unsubscribed,
    /// `on_subscribe` delivered; values may flow within granted demand.
    Active,
    /// A terminal signal was delivered (or the subscription was cancelled).
    Terminated,
}

/// Atomic holder for a subscription's [`LifecycleState`].
#[derive(Debug, Default)]
pub struct StateCell(AtomicU8);

impl StateCell {
    /// Creates a cell in the `Unsubscribed` state.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU8::new(UNSUBSCRIBED))
    }

    /// Attempts the `Unsubscribed -> Active` transition.
    ///
    /// Returns `false` if the cell was already active or terminated, which a
    /// caller must treat as a duplicate `on_subscribe`.
    pub fn activate(&self) -> bool {
        self.0
            .compare_exchange(UNSUBSCRIBED, ACTIVE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Attempts the transition into `Terminated` from any earlier state.
    ///
    /// Returns `true` exactly once; the first caller owns delivery of the
    /// terminal signal, every later caller must discard its signal.
    pub fn terminate(&self) -> bool {
        self.0.swap(TERMINATED, Ordering::AcqRel) != TERMINATED
    }

    /// `true` once a terminal transition has happened.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.0.load(Ordering::Acquire) == TERMINATED
    }

    /// Reads the current state.
    #[must_use]
    pub fn get(&self) -> LifecycleState {
        match self.0.load(Ordering::Acquire) {
            UNSUBSCRIBED => LifecycleState::Unsubscribed,
            ACTIVE => LifecycleState::Active,
            _ => LifecycleState::Terminated,
        }
    }
}

/// Records a signal that arrived after the terminal transition.
///
/// The contract tolerates extra in-flight signals during race windows; they
/// are dropped here, observably for tooling via a debug event.
pub fn discard_signal(stage: &'static str, signal: &'static str) {
    tracing::debug!(stage, signal, "discarding signal received after terminal state");
}
