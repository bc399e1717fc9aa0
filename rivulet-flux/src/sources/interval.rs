// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Scheduler-driven periodic tick source.

use crate::flux::Flux;
use crate::source::Source;
use rivulet_core::demand::{self, UNBOUNDED};
use rivulet_core::{
    Demand, RivuletError, ScheduledHandle, Scheduler, StageInfo, StateCell, Subscriber,
    Subscription, Worker,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

impl Flux<u64> {
    /// Emits `0, 1, 2, ...` every `period`, on a worker obtained from
    /// `scheduler`.
    ///
    /// Each subscription gets its own worker and its own tick counter. A tick
    /// that fires while the subscriber has zero outstanding demand terminates
    /// the sequence with an overflow error rather than buffering or silently
    /// skipping the tick.
    pub fn interval(period: Duration, scheduler: Arc<dyn Scheduler>) -> Self {
        Flux::from_source(IntervalSource { period, scheduler })
    }
}

struct IntervalSource {
    period: Duration,
    scheduler: Arc<dyn Scheduler>,
}

impl StageInfo for IntervalSource {
    fn stage_name(&self) -> &'static str {
        "interval"
    }
}

impl Source<u64> for IntervalSource {
    fn subscribe(&self, mut subscriber: Box<dyn Subscriber<u64>>) {
        let subscription = Arc::new(IntervalSubscription {
            period: self.period,
            worker: self.scheduler.create_worker(),
            subscriber: Mutex::new(None),
            demand: Demand::new(),
            state: StateCell::new(),
            cancelled: AtomicBool::new(false),
            pending: Mutex::new(None),
            tick: Mutex::new(0),
        });

        let handle: Arc<dyn Subscription> = Arc::clone(&subscription) as _;
        subscriber.on_subscribe(handle);
        *subscription.subscriber.lock() = Some(subscriber);
        subscription.state.activate();
        subscription.schedule_next();
    }
}

struct IntervalSubscription {
    period: Duration,
    worker: Arc<dyn Worker>,
    subscriber: Mutex<Option<Box<dyn Subscriber<u64>>>>,
    demand: Demand,
    state: StateCell,
    cancelled: AtomicBool,
    pending: Mutex<Option<Arc<dyn ScheduledHandle>>>,
    tick: Mutex<u64>,
}

impl IntervalSubscription {
    fn schedule_next(self: &Arc<Self>) {
        if self.cancelled.load(Ordering::Acquire) || self.state.is_terminated() {
            return;
        }
        let this = Arc::clone(self);
        let handle = self
            .worker
            .schedule_after(self.period, Box::new(move || this.fire()));
        *self.pending.lock() = Some(handle);
    }

    /// Runs on the worker. Ticks are serialized by the worker's FIFO
    /// guarantee, so no drain gate is needed here.
    fn fire(self: Arc<Self>) {
        if self.cancelled.load(Ordering::Acquire) || self.state.is_terminated() {
            return;
        }

        let granted = self.demand.get();
        let mut slot = self.subscriber.lock();
        let Some(subscriber) = slot.as_mut() else {
            return;
        };

        if granted == 0 {
            if self.state.terminate() {
                subscriber.on_error(RivuletError::overflow(
                    "interval tick fired with zero outstanding demand",
                ));
            }
            *slot = None;
            return;
        }

        let value = {
            let mut tick = self.tick.lock();
            let value = *tick;
            *tick += 1;
            value
        };
        subscriber.on_next(value);
        drop(slot);

        if granted != UNBOUNDED {
            self.demand.consume(1);
        }
        self.schedule_next();
    }

    fn fail(&self, error: RivuletError) {
        let mut slot = self.subscriber.lock();
        if let Some(subscriber) = slot.as_mut() {
            if self.state.terminate() {
                subscriber.on_error(error);
            }
            *slot = None;
        }
    }
}

impl Subscription for IntervalSubscription {
    fn request(&self, n: u64) {
        if let Err(violation) = demand::validate(n) {
            let pending = self.pending.lock().take();
            if let Some(handle) = pending {
                handle.cancel();
            }
            self.fail(violation);
            return;
        }
        self.demand.add(n);
    }

    fn cancel(&self) {
        if self.state.is_terminated() {
            return;
        }
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.state.terminate();
        let pending = self.pending.lock().take();
        if let Some(handle) = pending {
            handle.cancel();
        }
        *self.subscriber.lock() = None;
    }
}
