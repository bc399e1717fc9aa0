// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Round-robin dispatch of one upstream across the rails.
//!
//! Each rail is a [`Processor`] that buffers and honors its own
//! subscriber's demand. The shared upstream is requested in aggregate
//! prefetch batches (`rails * prefetch`) and re-requested as total rail
//! consumption catches up, so one slow rail paces the split without
//! unbounded buffering. A cancelled rail is skipped by the dispatcher; when
//! every rail has cancelled, the upstream is cancelled too. An upstream
//! error is broadcast to all rails.

use crate::parallel::ParallelSource;
use parking_lot::Mutex;
use rivulet_core::state::discard_signal;
use rivulet_core::{RivuletError, Subscriber, Subscription};
use rivulet_flux::{Flux, Processor};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

pub(crate) struct DispatchSource<T: Send + 'static> {
    upstream: Flux<T>,
    rails: usize,
    prefetch: usize,
}

impl<T: Send + 'static> DispatchSource<T> {
    pub(crate) fn new(upstream: Flux<T>, rails: usize, prefetch: usize) -> Self {
        Self {
            upstream,
            rails,
            prefetch,
        }
    }
}

struct Pacing {
    upstream_sub: Mutex<Option<Arc<dyn Subscription>>>,
    requested: Mutex<u64>,
    consumed: AtomicU64,
    live_rails: AtomicUsize,
    batch: u64,
}

impl Pacing {
    /// Re-requests once total consumption warrants another batch.
    fn maybe_request(&self) {
        let (sub, extra) = {
            let mut requested = self.requested.lock();
            let target = self
                .consumed
                .load(Ordering::Acquire)
                .saturating_add(self.batch);
            if target <= *requested {
                return;
            }
            let sub = self.upstream_sub.lock().clone();
            let Some(sub) = sub else {
                return;
            };
            let extra = target - *requested;
            *requested = target;
            (sub, extra)
        };
        sub.request(extra);
    }

    fn cancel_upstream(&self) {
        if let Some(sub) = self.upstream_sub.lock().take() {
            sub.cancel();
        }
    }
}

impl<T: Send + 'static> ParallelSource<T> for DispatchSource<T> {
    fn parallelism(&self) -> usize {
        self.rails
    }

    fn subscribe_rails(&self, subscribers: Vec<Box<dyn Subscriber<T>>>) {
        assert_eq!(
            subscribers.len(),
            self.rails,
            "one subscriber per rail is required"
        );

        let pacing = Arc::new(Pacing {
            upstream_sub: Mutex::new(None),
            requested: Mutex::new(0),
            consumed: AtomicU64::new(0),
            live_rails: AtomicUsize::new(self.rails),
            batch: (self.rails * self.prefetch) as u64,
        });

        let mut rails: Vec<Processor<T>> = Vec::with_capacity(self.rails);
        for subscriber in subscribers {
            let processor: Processor<T> = Processor::new();
            {
                let pacing = Arc::clone(&pacing);
                processor.set_on_consume(move |n| {
                    pacing.consumed.fetch_add(n, Ordering::AcqRel);
                    pacing.maybe_request();
                });
            }
            {
                let pacing = Arc::clone(&pacing);
                let backlog = processor.clone();
                let rail = rails.len();
                processor.set_on_cancel(move || {
                    // Whatever the rail still had queued will never be
                    // consumed; count it so pacing does not stall.
                    let queued = backlog.queued() as u64;
                    pacing.consumed.fetch_add(queued, Ordering::AcqRel);
                    if pacing.live_rails.fetch_sub(1, Ordering::AcqRel) == 1 {
                        tracing::debug!(rail, queued, "last rail cancelled, cancelling upstream");
                        pacing.cancel_upstream();
                    } else {
                        tracing::debug!(rail, queued, "rail cancelled, dispatch continues on the rest");
                        pacing.maybe_request();
                    }
                });
            }
            processor.subscribe_boxed(subscriber);
            rails.push(processor);
        }

        self.upstream.subscribe_boxed(Box::new(DispatchSubscriber {
            rails,
            pacing,
            cursor: 0,
        }));
    }
}

struct DispatchSubscriber<T: Send + 'static> {
    rails: Vec<Processor<T>>,
    pacing: Arc<Pacing>,
    cursor: usize,
}

impl<T: Send + 'static> Subscriber<T> for DispatchSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        *self.pacing.upstream_sub.lock() = Some(subscription);
        self.pacing.maybe_request();
    }

    fn on_next(&mut self, value: T) {
        // Round-robin over the rails that are still live.
        let mut value = Some(value);
        for _ in 0..self.rails.len() {
            let rail = &self.rails[self.cursor];
            self.cursor = (self.cursor + 1) % self.rails.len();
            if !rail.is_cancelled() {
                if let Some(value) = value.take() {
                    rail.push(value);
                }
                return;
            }
        }
        discard_signal("parallel", "on_next");
        self.pacing.cancel_upstream();
    }

    fn on_error(&mut self, error: RivuletError) {
        for rail in &self.rails {
            rail.fail(error.clone());
        }
    }

    fn on_complete(&mut self) {
        for rail in &self.rails {
            rail.complete();
        }
    }
}
