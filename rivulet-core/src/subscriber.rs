// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The producer-to-consumer half of the protocol.

use crate::{RivuletError, Subscription};
use std::sync::Arc;

/// Receiver of the four downstream signals.
///
/// The producer guarantees: `on_subscribe` first and exactly once, `on_next`
/// only within granted demand, then exactly one of `on_complete`/`on_error`.
/// Deliveries to one subscriber are serialized, which is why the methods take
/// `&mut self`; producers own their subscriber and drain through a gate.
pub trait Subscriber<T>: Send {
    /// First signal; hands over the [`Subscription`] used to grant demand and
    /// cancel.
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>);

    /// One value, delivered within previously granted demand.
    fn on_next(&mut self, value: T);

    /// Terminal failure signal. No signal of any kind follows.
    fn on_error(&mut self, error: RivuletError);

    /// Terminal completion signal. No signal of any kind follows.
    fn on_complete(&mut self);
}

impl<T> Subscriber<T> for Box<dyn Subscriber<T>> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        (**self).on_subscribe(subscription);
    }

    fn on_next(&mut self, value: T) {
        (**self).on_next(value);
    }

    fn on_error(&mut self, error: RivuletError) {
        (**self).on_error(error);
    }

    fn on_complete(&mut self) {
        (**self).on_complete();
    }
}
