// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Predicate filtering with demand replenishment.

use crate::flux::Flux;
use crate::source::Source;
use rivulet_core::state::discard_signal;
use rivulet_core::{RivuletError, StageInfo, Subscriber, Subscription};
use std::sync::Arc;

impl<T: Send + 'static> Flux<T> {
    /// Keeps only values for which `predicate` returns `true`.
    ///
    /// A dropped value consumed one unit of upstream demand without producing
    /// a downstream value, so the stage re-requests one to keep downstream
    /// demand satisfiable.
    pub fn filter<F>(&self, predicate: F) -> Flux<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Flux::from_source(FilterSource {
            upstream: self.clone(),
            predicate: Arc::new(predicate),
        })
    }
}

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

struct FilterSource<T: Send + 'static> {
    upstream: Flux<T>,
    predicate: Predicate<T>,
}

impl<T: Send + 'static> StageInfo for FilterSource<T> {
    fn stage_name(&self) -> &'static str {
        "filter"
    }

    fn upstream(&self) -> Option<&dyn StageInfo> {
        Some(self.upstream.source.as_ref())
    }
}

impl<T: Send + 'static> Source<T> for FilterSource<T> {
    fn subscribe(&self, subscriber: Box<dyn Subscriber<T>>) {
        self.upstream.subscribe_boxed(Box::new(FilterSubscriber {
            downstream: subscriber,
            predicate: Arc::clone(&self.predicate),
            upstream: None,
            done: false,
        }));
    }
}

struct FilterSubscriber<T> {
    downstream: Box<dyn Subscriber<T>>,
    predicate: Predicate<T>,
    upstream: Option<Arc<dyn Subscription>>,
    done: bool,
}

impl<T: Send + 'static> Subscriber<T> for FilterSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        self.upstream = Some(Arc::clone(&subscription));
        self.downstream.on_subscribe(subscription);
    }

    fn on_next(&mut self, value: T) {
        if self.done {
            discard_signal("filter", "on_next");
            return;
        }
        if (self.predicate)(&value) {
            self.downstream.on_next(value);
        } else if let Some(upstream) = &self.upstream {
            upstream.request(1);
        }
    }

    fn on_error(&mut self, error: RivuletError) {
        if self.done {
            discard_signal("filter", "on_error");
            return;
        }
        self.done = true;
        self.downstream.on_error(error);
    }

    fn on_complete(&mut self) {
        if self.done {
            discard_signal("filter", "on_complete");
            return;
        }
        self.done = true;
        self.downstream.on_complete();
    }
}
