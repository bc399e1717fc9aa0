// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The consumer-to-producer half of the protocol.

/// Handle a producer hands its subscriber, carrying the two upstream signals:
/// demand grants and cancellation.
///
/// Both methods may be called from any thread, at any time after
/// `on_subscribe`, including concurrently with in-flight deliveries.
pub trait Subscription: Send + Sync {
    /// Grants `n` more values to the producer. Additive; saturates at
    /// [`crate::demand::UNBOUNDED`].
    ///
    /// Requesting zero is a protocol violation: the producer fails the
    /// subscription with [`crate::RivuletError::ProtocolViolation`] rather
    /// than panicking.
    fn request(&self, n: u64);

    /// Stops the subscription. Idempotent; after it returns no further values
    /// are delivered, and a cancel arriving after the terminal signal is a
    /// no-op.
    fn cancel(&self);
}

/// Subscription for sources that terminate at subscribe time (`empty`,
/// `error`): demand is meaningless and cancellation has nothing to stop.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptySubscription;

impl Subscription for EmptySubscription {
    fn request(&self, _n: u64) {}

    fn cancel(&self) {}
}
