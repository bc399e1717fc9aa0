// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Exposing the rails as keyed groups.

use crate::parallel::{ParallelFlux, ParallelSource};
use rivulet_core::demand::UNBOUNDED;
use rivulet_core::{RivuletError, StageInfo, Subscriber, Subscription};
use rivulet_flux::{Flux, GroupedFlux, Processor, Source};
use std::sync::Arc;

impl<T: Send + 'static> ParallelFlux<T> {
    /// Exposes each rail as a [`GroupedFlux`] keyed by its rail index.
    ///
    /// The outer sequence emits exactly `parallelism()` groups and
    /// completes; each group then follows its rail's lifecycle. Cancelling
    /// a group cancels that rail.
    #[must_use]
    pub fn groups(&self) -> Flux<GroupedFlux<usize, T>> {
        Flux::from_source(GroupsSource {
            parallel: Arc::clone(&self.source),
        })
    }
}

struct GroupsSource<T: Send + 'static> {
    parallel: Arc<dyn ParallelSource<T>>,
}

impl<T: Send + 'static> StageInfo for GroupsSource<T> {
    fn stage_name(&self) -> &'static str {
        "parallel_groups"
    }
}

impl<T: Send + 'static> Source<GroupedFlux<usize, T>> for GroupsSource<T> {
    fn subscribe(&self, subscriber: Box<dyn Subscriber<GroupedFlux<usize, T>>>) {
        let rails = self.parallel.parallelism();
        let outer: Processor<GroupedFlux<usize, T>> = Processor::new();

        let mut rail_subscribers: Vec<Box<dyn Subscriber<T>>> = Vec::with_capacity(rails);
        for index in 0..rails {
            let processor: Processor<T> = Processor::new();
            outer.push(GroupedFlux::new(index, processor.flux()));
            rail_subscribers.push(Box::new(ForwardSubscriber { processor }));
        }
        // The set of rails is fixed, so the outer sequence is complete as
        // soon as the groups are out.
        outer.complete();

        self.parallel.subscribe_rails(rail_subscribers);
        outer.subscribe_boxed(subscriber);
    }
}

struct ForwardSubscriber<T: Send + 'static> {
    processor: Processor<T>,
}

impl<T: Send + 'static> Subscriber<T> for ForwardSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        let upstream = Arc::clone(&subscription);
        self.processor.set_on_cancel(move || upstream.cancel());
        subscription.request(UNBOUNDED);
    }

    fn on_next(&mut self, value: T) {
        self.processor.push(value);
    }

    fn on_error(&mut self, error: RivuletError) {
        self.processor.fail(error);
    }

    fn on_complete(&mut self) {
        self.processor.complete();
    }
}
