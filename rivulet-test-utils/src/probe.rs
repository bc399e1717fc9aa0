// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A recording subscriber for protocol-level assertions.

use parking_lot::{Condvar, Mutex};
use rivulet_core::{RivuletError, Subscriber, Subscription};
use std::sync::Arc;
use std::time::Duration;

struct ProbeState<T> {
    values: Vec<T>,
    signals: Vec<&'static str>,
    terminal: Option<Option<RivuletError>>,
    subscription: Option<Arc<dyn Subscription>>,
}

struct Shared<T> {
    state: Mutex<ProbeState<T>>,
    cond: Condvar,
}

/// Records every signal a producer delivers and exposes explicit demand
/// control, so a test can drive the backpressure protocol by hand.
///
/// The probe itself is a cheap handle; [`TestProbe::subscriber`] mints the
/// [`Subscriber`] to pass to `subscribe`, and the handle observes everything
/// it records. Waits block the test thread with a timeout instead of
/// spinning.
pub struct TestProbe<T> {
    shared: Arc<Shared<T>>,
    initial_request: u64,
}

impl<T> Clone for TestProbe<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            initial_request: self.initial_request,
        }
    }
}

impl<T: Send + 'static> Default for TestProbe<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> TestProbe<T> {
    /// A probe that requests nothing on subscription; demand is granted
    /// explicitly through [`TestProbe::request`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_request(0)
    }

    /// A probe that requests `n` as soon as it is subscribed.
    #[must_use]
    pub fn with_request(n: u64) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ProbeState {
                    values: Vec::new(),
                    signals: Vec::new(),
                    terminal: None,
                    subscription: None,
                }),
                cond: Condvar::new(),
            }),
            initial_request: n,
        }
    }

    /// A probe with unbounded initial demand.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::with_request(rivulet_core::demand::UNBOUNDED)
    }

    /// The [`Subscriber`] half to hand to `Flux::subscribe`.
    #[must_use]
    pub fn subscriber(&self) -> ProbeSubscriber<T> {
        ProbeSubscriber {
            shared: Arc::clone(&self.shared),
            initial_request: self.initial_request,
        }
    }

    /// Requests `n` more values through the recorded subscription.
    ///
    /// # Panics
    ///
    /// If the probe was never subscribed.
    pub fn request(&self, n: u64) {
        let subscription = self
            .shared
            .state
            .lock()
            .subscription
            .clone()
            .expect("probe is not subscribed");
        subscription.request(n);
    }

    /// Cancels the recorded subscription.
    ///
    /// # Panics
    ///
    /// If the probe was never subscribed.
    pub fn cancel(&self) {
        let subscription = self
            .shared
            .state
            .lock()
            .subscription
            .clone()
            .expect("probe is not subscribed");
        subscription.cancel();
    }

    /// `true` once `on_subscribe` was delivered.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.shared.state.lock().subscription.is_some()
    }

    /// Values delivered so far, in order.
    #[must_use]
    pub fn values(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.shared.state.lock().values.clone()
    }

    /// Number of values delivered so far.
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.shared.state.lock().values.len()
    }

    /// Signal names in delivery order (`"on_subscribe"`, `"on_next"`, ...).
    #[must_use]
    pub fn signals(&self) -> Vec<&'static str> {
        self.shared.state.lock().signals.clone()
    }

    /// `true` once a terminal signal was delivered.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.shared.state.lock().terminal.is_some()
    }

    /// `true` if the terminal signal was `on_complete`.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self.shared.state.lock().terminal, Some(None))
    }

    /// The terminal error, if the sequence failed.
    #[must_use]
    pub fn error(&self) -> Option<RivuletError> {
        self.shared
            .state
            .lock()
            .terminal
            .as_ref()
            .and_then(Clone::clone)
    }

    /// Blocks until a terminal signal arrives. Returns `false` on timeout.
    #[must_use]
    pub fn await_terminal(&self, timeout: Duration) -> bool {
        let mut state = self.shared.state.lock();
        !self
            .shared
            .cond
            .wait_while_for(&mut state, |s| s.terminal.is_none(), timeout)
            .timed_out()
    }

    /// Blocks until at least `n` values were delivered. Returns `false` on
    /// timeout.
    #[must_use]
    pub fn await_values(&self, n: usize, timeout: Duration) -> bool {
        let mut state = self.shared.state.lock();
        !self
            .shared
            .cond
            .wait_while_for(&mut state, |s| s.values.len() < n, timeout)
            .timed_out()
    }
}

/// The [`Subscriber`] half of a [`TestProbe`].
pub struct ProbeSubscriber<T> {
    shared: Arc<Shared<T>>,
    initial_request: u64,
}

impl<T: Send + 'static> Subscriber<T> for ProbeSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        {
            let mut state = self.shared.state.lock();
            state.signals.push("on_subscribe");
            state.subscription = Some(Arc::clone(&subscription));
        }
        self.shared.cond.notify_all();
        if self.initial_request > 0 {
            subscription.request(self.initial_request);
        }
    }

    fn on_next(&mut self, value: T) {
        {
            let mut state = self.shared.state.lock();
            state.signals.push("on_next");
            state.values.push(value);
        }
        self.shared.cond.notify_all();
    }

    fn on_error(&mut self, error: RivuletError) {
        {
            let mut state = self.shared.state.lock();
            state.signals.push("on_error");
            state.terminal = Some(Some(error));
        }
        self.shared.cond.notify_all();
    }

    fn on_complete(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.signals.push("on_complete");
            state.terminal = Some(None);
        }
        self.shared.cond.notify_all();
    }
}
