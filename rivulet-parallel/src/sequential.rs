// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Merging the rails back into one sequence.

use crate::parallel::{ParallelFlux, ParallelSource};
use parking_lot::Mutex;
use rivulet_core::demand::UNBOUNDED;
use rivulet_core::{RivuletError, StageInfo, Subscriber, Subscription};
use rivulet_flux::{Flux, Processor};
use rivulet_flux::Source;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

impl<T: Send + 'static> ParallelFlux<T> {
    /// Merges the rails back into a single sequence in arrival order.
    ///
    /// Values are interleaved as the rails produce them; the merged
    /// sequence completes once every rail has completed, and fails as soon
    /// as any rail fails (the remaining rails are cancelled). The merge
    /// consumes the rails eagerly; downstream demand is honored by the
    /// merge buffer.
    #[must_use]
    pub fn sequential(&self) -> Flux<T> {
        Flux::from_source(SequentialSource {
            parallel: Arc::clone(&self.source),
        })
    }
}

struct SequentialSource<T: Send + 'static> {
    parallel: Arc<dyn ParallelSource<T>>,
}

impl<T: Send + 'static> StageInfo for SequentialSource<T> {
    fn stage_name(&self) -> &'static str {
        "sequential"
    }
}

impl<T: Send + 'static> Source<T> for SequentialSource<T> {
    fn subscribe(&self, subscriber: Box<dyn Subscriber<T>>) {
        let outer: Processor<T> = Processor::new();
        let rails = self.parallel.parallelism();
        let remaining = Arc::new(AtomicUsize::new(rails));
        let rail_subs: Arc<Mutex<Vec<Arc<dyn Subscription>>>> =
            Arc::new(Mutex::new(Vec::with_capacity(rails)));

        {
            let rail_subs = Arc::clone(&rail_subs);
            outer.set_on_cancel(move || {
                for sub in rail_subs.lock().drain(..) {
                    sub.cancel();
                }
            });
        }

        let subscribers = (0..rails)
            .map(|_| {
                Box::new(MergeRailSubscriber {
                    outer: outer.clone(),
                    remaining: Arc::clone(&remaining),
                    rail_subs: Arc::clone(&rail_subs),
                }) as Box<dyn Subscriber<T>>
            })
            .collect();
        self.parallel.subscribe_rails(subscribers);
        outer.subscribe_boxed(subscriber);
    }
}

struct MergeRailSubscriber<T: Send + 'static> {
    outer: Processor<T>,
    remaining: Arc<AtomicUsize>,
    rail_subs: Arc<Mutex<Vec<Arc<dyn Subscription>>>>,
}

impl<T: Send + 'static> Subscriber<T> for MergeRailSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        self.rail_subs.lock().push(Arc::clone(&subscription));
        subscription.request(UNBOUNDED);
    }

    fn on_next(&mut self, value: T) {
        // The processor's drain gate serializes pushes arriving from
        // concurrent rails.
        self.outer.push(value);
    }

    fn on_error(&mut self, error: RivuletError) {
        self.outer.fail(error);
        for sub in self.rail_subs.lock().drain(..) {
            sub.cancel();
        }
    }

    fn on_complete(&mut self) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.outer.complete();
        }
    }
}
