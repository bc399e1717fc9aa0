// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Iterator-backed sources: the cold `from_iter` and the hot `just`.

use crate::drain::DrainGate;
use crate::flux::Flux;
use crate::source::Source;
use rivulet_core::demand::{self, UNBOUNDED};
use rivulet_core::{Demand, RivuletError, StageInfo, StateCell, Subscriber, Subscription};
use parking_lot::Mutex;
use std::iter::Peekable;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

impl<T: Send + 'static> Flux<T> {
    /// Cold source over a cloneable iterable.
    ///
    /// The iterable is cloned and traversed independently for every
    /// subscription: N subscribers means N full, independent traversals and
    /// zero subscribers means none at all.
    pub fn from_iter<I>(iterable: I) -> Self
    where
        I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
        I::IntoIter: Send + 'static,
    {
        Flux::from_source(IterSource {
            iterable,
            name: "from_iter",
        })
    }

    /// Hot source over a single captured value.
    ///
    /// The value is captured here, once, at assembly time; subscribing never
    /// re-runs whatever computation produced it. Each subscriber receives a
    /// clone of the captured value followed by completion.
    pub fn just(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Flux::from_source(IterSource {
            iterable: Some(value),
            name: "just",
        })
    }
}

struct IterSource<I> {
    iterable: I,
    name: &'static str,
}

impl<I: Send + Sync + 'static> StageInfo for IterSource<I> {
    fn stage_name(&self) -> &'static str {
        self.name
    }
}

impl<T, I> Source<T> for IterSource<I>
where
    T: Send + 'static,
    I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
    I::IntoIter: Send + 'static,
{
    fn subscribe(&self, mut subscriber: Box<dyn Subscriber<T>>) {
        let subscription = Arc::new(IterSubscription {
            iter: Mutex::new(Some(self.iterable.clone().into_iter().peekable())),
            subscriber: Mutex::new(None),
            demand: Demand::new(),
            gate: DrainGate::new(),
            state: StateCell::new(),
            cancelled: AtomicBool::new(false),
            violation: Mutex::new(None),
        });

        subscription.gate.prime();
        let handle: Arc<dyn Subscription> = Arc::clone(&subscription) as _;
        subscriber.on_subscribe(handle);
        *subscription.subscriber.lock() = Some(subscriber);
        subscription.state.activate();
        subscription.drain_loop();
    }
}

struct IterSubscription<It: Iterator> {
    iter: Mutex<Option<Peekable<It>>>,
    subscriber: Mutex<Option<Box<dyn Subscriber<It::Item>>>>,
    demand: Demand,
    gate: DrainGate,
    state: StateCell,
    cancelled: AtomicBool,
    violation: Mutex<Option<RivuletError>>,
}

impl<It> IterSubscription<It>
where
    It: Iterator + Send + 'static,
    It::Item: Send + 'static,
{
    fn drain(&self) {
        if self.gate.enter() {
            self.drain_loop();
        }
    }

    fn drain_loop(&self) {
        let mut missed = 1;
        loop {
            self.drain_pass();
            missed = self.gate.exit(missed);
            if missed == 0 {
                break;
            }
        }
    }

    fn drain_pass(&self) {
        let mut slot = self.subscriber.lock();
        let Some(subscriber) = slot.as_mut() else {
            return;
        };

        let mut emitted = 0u64;
        loop {
            if self.cancelled.load(Ordering::Acquire) {
                *self.iter.lock() = None;
                *slot = None;
                break;
            }

            if let Some(violation) = self.violation.lock().take() {
                if self.state.terminate() {
                    subscriber.on_error(violation);
                }
                *self.iter.lock() = None;
                *slot = None;
                break;
            }

            let mut iter_slot = self.iter.lock();
            let Some(iter) = iter_slot.as_mut() else {
                break;
            };

            if iter.peek().is_none() {
                *iter_slot = None;
                drop(iter_slot);
                if self.state.terminate() {
                    subscriber.on_complete();
                }
                *slot = None;
                break;
            }

            let granted = self.demand.get();
            if granted != UNBOUNDED && emitted >= granted {
                break;
            }

            let Some(value) = iter.next() else {
                continue;
            };
            drop(iter_slot);
            subscriber.on_next(value);
            emitted += 1;
        }
        drop(slot);

        if emitted > 0 {
            self.demand.consume(emitted);
        }
    }
}

impl<It> Subscription for IterSubscription<It>
where
    It: Iterator + Send + 'static,
    It::Item: Send + 'static,
{
    fn request(&self, n: u64) {
        match demand::validate(n) {
            Ok(()) => {
                self.demand.add(n);
            }
            Err(violation) => {
                *self.violation.lock() = Some(violation);
            }
        }
        self.drain();
    }

    fn cancel(&self) {
        if self.state.is_terminated() {
            return;
        }
        self.cancelled.store(true, Ordering::Release);
        self.drain();
    }
}
