// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Single-subscriber buffering processor.
//!
//! A [`Processor`] is the push-side entry point into a chain and the building
//! block behind groups, windows, multicast slots and parallel rails. Values
//! pushed before the subscriber has demand (or before it subscribes at all)
//! are queued and replayed in order, so a lazily consumed sub-sequence never
//! loses elements.
//!
//! ## Characteristics
//!
//! - **Single subscriber**: a second subscription is rejected with a
//!   protocol-violation error; multicast is built on top (one processor per
//!   slot), not inside.
//! - **Unbounded queue**: the queue grows with the gap between producer and
//!   consumer; stages that need a cap enforce it outside.
//! - **Demand-honoring**: queued values are only delivered within the
//!   subscriber's granted demand.
//! - **Thread-safe**: `push`/`complete`/`fail` and `request`/`cancel` may
//!   arrive from any thread; deliveries are serialized through a
//!   [`DrainGate`](crate::DrainGate).

use crate::drain::DrainGate;
use crate::flux::Flux;
use crate::source::Source;
use rivulet_core::demand::{self, UNBOUNDED};
use rivulet_core::state::discard_signal;
use rivulet_core::{Demand, RivuletError, StageInfo, StateCell, Subscriber, Subscription};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

type ConsumeHook = Box<dyn Fn(u64) + Send + Sync>;
type CancelHook = Box<dyn FnOnce() + Send>;

struct Inner<T> {
    queue: Mutex<VecDeque<T>>,
    subscriber: Mutex<Option<Box<dyn Subscriber<T>>>>,
    demand: Demand,
    gate: DrainGate,
    state: StateCell,
    cancelled: AtomicBool,
    subscribed: AtomicBool,
    // Some(None) = pending completion, Some(Some(e)) = pending error.
    terminal: Mutex<Option<Option<RivuletError>>>,
    emitted: AtomicU64,
    on_consume: Mutex<Option<ConsumeHook>>,
    on_cancel: Mutex<Option<CancelHook>>,
}

/// Push-driven, single-subscriber sequence head.
pub struct Processor<T: Send + 'static> {
    inner: Arc<Inner<T>>,
}

impl<T: Send + 'static> Clone for Processor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> Default for Processor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Processor<T> {
    /// Creates an empty processor with no subscriber.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                queue: Mutex::new(VecDeque::new()),
                subscriber: Mutex::new(None),
                demand: Demand::new(),
                gate: DrainGate::new(),
                state: StateCell::new(),
                cancelled: AtomicBool::new(false),
                subscribed: AtomicBool::new(false),
                terminal: Mutex::new(None),
                emitted: AtomicU64::new(0),
                on_consume: Mutex::new(None),
                on_cancel: Mutex::new(None),
            }),
        }
    }

    /// Queues one value for delivery. Discarded (observably, at debug level)
    /// after a terminal signal or cancellation.
    pub fn push(&self, value: T) {
        if self.inner.cancelled.load(Ordering::Acquire)
            || self.inner.state.is_terminated()
            || self.inner.terminal.lock().is_some()
        {
            discard_signal("processor", "on_next");
            return;
        }
        self.inner.queue.lock().push_back(value);
        self.inner.drain();
    }

    /// Marks the sequence complete. Queued values are still delivered first.
    pub fn complete(&self) {
        {
            let mut terminal = self.inner.terminal.lock();
            if terminal.is_some() || self.inner.state.is_terminated() {
                discard_signal("processor", "on_complete");
                return;
            }
            *terminal = Some(None);
        }
        self.inner.drain();
    }

    /// Fails the sequence. Queued values are discarded and the error is
    /// delivered as soon as the subscriber is attached.
    pub fn fail(&self, error: RivuletError) {
        {
            let mut terminal = self.inner.terminal.lock();
            if terminal.is_some() || self.inner.state.is_terminated() {
                discard_signal("processor", "on_error");
                return;
            }
            *terminal = Some(Some(error));
        }
        self.inner.queue.lock().clear();
        self.inner.drain();
    }

    /// The sequence view of this processor.
    #[must_use]
    pub fn flux(&self) -> Flux<T> {
        Flux::from_arc(Arc::new(ProcessorSource {
            inner: Arc::clone(&self.inner),
        }))
    }

    /// Directly attaches a subscriber (equivalent to `self.flux().subscribe`).
    pub fn subscribe<S: Subscriber<T> + 'static>(&self, subscriber: S) {
        self.subscribe_boxed(Box::new(subscriber));
    }

    /// [`Processor::subscribe`] for an already boxed subscriber.
    pub fn subscribe_boxed(&self, subscriber: Box<dyn Subscriber<T>>) {
        ProcessorSource {
            inner: Arc::clone(&self.inner),
        }
        .subscribe(subscriber);
    }

    /// `true` once the subscriber has cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// `true` once a terminal signal has been accepted (it may still be
    /// pending delivery behind queued values).
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.inner.state.is_terminated() || self.inner.terminal.lock().is_some()
    }

    /// Number of values queued and not yet delivered.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// Total values delivered to the subscriber so far.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.inner.emitted.load(Ordering::Acquire)
    }

    /// Drops queued, undelivered values. Used when the producing side is
    /// severed and its backlog must not leak into a successor.
    pub(crate) fn clear_queued(&self) {
        self.inner.queue.lock().clear();
    }

    /// Installs a hook invoked with the number of values delivered by each
    /// drain pass. Stages that pace an upstream (multicast, rails) use this
    /// as their consumption signal.
    pub fn set_on_consume(&self, hook: impl Fn(u64) + Send + Sync + 'static) {
        *self.inner.on_consume.lock() = Some(Box::new(hook));
    }

    /// Installs a hook invoked once when the subscriber cancels.
    pub fn set_on_cancel(&self, hook: impl FnOnce() + Send + 'static) {
        *self.inner.on_cancel.lock() = Some(Box::new(hook));
    }
}

impl<T: Send + 'static> Inner<T> {
    fn drain(self: &Arc<Self>) {
        if self.gate.enter() {
            self.drain_loop();
        }
    }

    fn drain_loop(self: &Arc<Self>) {
        let mut missed = 1;
        loop {
            self.drain_pass();
            missed = self.gate.exit(missed);
            if missed == 0 {
                break;
            }
        }
    }

    fn drain_pass(self: &Arc<Self>) {
        let mut slot = self.subscriber.lock();
        let Some(subscriber) = slot.as_mut() else {
            if self.cancelled.load(Ordering::Acquire) {
                self.queue.lock().clear();
            }
            return;
        };

        let mut delivered = 0u64;
        loop {
            if self.cancelled.load(Ordering::Acquire) {
                self.queue.lock().clear();
                *slot = None;
                break;
            }

            let granted = self.demand.get();
            let value = if granted == UNBOUNDED || delivered < granted {
                self.queue.lock().pop_front()
            } else {
                None
            };

            match value {
                Some(value) => {
                    subscriber.on_next(value);
                    delivered += 1;
                }
                None => {
                    // Queue exhausted (or demand met): deliver a pending
                    // terminal only once the queue is fully drained.
                    let queue_empty = self.queue.lock().is_empty();
                    if queue_empty {
                        let pending = self.terminal.lock().take();
                        if let Some(terminal) = pending {
                            if self.state.terminate() {
                                match terminal {
                                    Some(error) => subscriber.on_error(error),
                                    None => subscriber.on_complete(),
                                }
                            }
                            *slot = None;
                        }
                    }
                    break;
                }
            }
        }
        drop(slot);

        if delivered > 0 {
            self.demand.consume(delivered);
            self.emitted.fetch_add(delivered, Ordering::AcqRel);
            let hook = self.on_consume.lock();
            if let Some(hook) = hook.as_ref() {
                hook(delivered);
            }
        }
    }
}

struct ProcessorSource<T: Send + 'static> {
    inner: Arc<Inner<T>>,
}

impl<T: Send + 'static> StageInfo for ProcessorSource<T> {
    fn stage_name(&self) -> &'static str {
        "processor"
    }
}

impl<T: Send + 'static> Source<T> for ProcessorSource<T> {
    fn subscribe(&self, mut subscriber: Box<dyn Subscriber<T>>) {
        if self.inner.subscribed.swap(true, Ordering::AcqRel) {
            subscriber.on_subscribe(Arc::new(rivulet_core::EmptySubscription));
            subscriber.on_error(RivuletError::violation(
                "processor supports at most one subscriber",
            ));
            return;
        }

        // Claim the gate so requests made inside on_subscribe accumulate
        // until we run the first drain loop below. If a pusher's drain is
        // already in flight the claim fails; we must then signal a normal
        // pass instead of retiring a token we never acquired.
        let primed = self.inner.gate.prime();
        let subscription = Arc::new(ProcessorSubscription {
            inner: Arc::clone(&self.inner),
        });
        subscriber.on_subscribe(subscription);
        *self.inner.subscriber.lock() = Some(subscriber);
        self.inner.state.activate();
        if primed {
            self.inner.drain_loop();
        } else {
            self.inner.drain();
        }
    }
}

struct ProcessorSubscription<T: Send + 'static> {
    inner: Arc<Inner<T>>,
}

impl<T: Send + 'static> Subscription for ProcessorSubscription<T> {
    fn request(&self, n: u64) {
        if let Err(violation) = demand::validate(n) {
            // Fail the subscription at the point of violation: pending
            // values are dropped and the error is delivered immediately.
            {
                let mut terminal = self.inner.terminal.lock();
                if terminal.is_some() {
                    return;
                }
                *terminal = Some(Some(violation));
            }
            self.inner.queue.lock().clear();
            self.inner.drain();
            return;
        }
        self.inner.demand.add(n);
        self.inner.drain();
    }

    fn cancel(&self) {
        if self.inner.state.is_terminated() {
            // Post-terminal cancellation is a no-op.
            return;
        }
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.state.terminate();
        let hook = self.inner.on_cancel.lock().take();
        if let Some(hook) = hook {
            hook();
        }
        self.inner.drain();
    }
}
