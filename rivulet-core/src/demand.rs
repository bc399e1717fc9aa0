// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Atomic demand accounting.
//!
//! Demand is the number of values a consumer has granted its producer and not
//! yet received. Requests are additive and saturate at the [`UNBOUNDED`]
//! sentinel; once unbounded, a counter stays unbounded for the rest of the
//! subscription (emission no longer decrements it).

use crate::{Result, RivuletError};
use std::sync::atomic::{AtomicU64, Ordering};

/// Sentinel request amount meaning "no backpressure, emit freely".
pub const UNBOUNDED: u64 = u64::MAX;

/// Validates a request amount against the backpressure contract.
///
/// # Errors
///
/// Returns [`RivuletError::ProtocolViolation`] for a zero request. The caller
/// is expected to deliver the error as the subscription's terminal signal.
pub fn validate(n: u64) -> Result<()> {
    if n == 0 {
        Err(RivuletError::violation(
            "request amount must be a positive integer",
        ))
    } else {
        Ok(())
    }
}

/// Thread-safe outstanding-demand counter.
///
/// Shared between one producer and one consumer: the consumer adds via
/// [`Demand::add`], the producer reads via [`Demand::get`] and settles emitted
/// values via [`Demand::consume`].
#[derive(Debug, Default)]
pub struct Demand(AtomicU64);

impl Demand {
    /// Creates a counter with zero outstanding demand.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Adds `n` to the outstanding demand, saturating at [`UNBOUNDED`].
    ///
    /// Returns the previous outstanding amount, which lets producers detect
    /// the 0 -> n transition that should kick off a drain.
    pub fn add(&self, n: u64) -> u64 {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            if current == UNBOUNDED {
                return UNBOUNDED;
            }
            let next = current.saturating_add(n);
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(prev) => return prev,
                Err(actual) => current = actual,
            }
        }
    }

    /// Settles `n` emitted values against the outstanding demand.
    ///
    /// Unbounded demand is left untouched; bounded demand is floored at zero
    /// so a racing late `add` is never lost.
    pub fn consume(&self, n: u64) {
        if n == 0 {
            return;
        }
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            if current == UNBOUNDED {
                return;
            }
            let next = current.saturating_sub(n);
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Current outstanding demand.
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// `true` if the counter has saturated to [`UNBOUNDED`].
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.get() == UNBOUNDED
    }
}
