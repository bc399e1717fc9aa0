// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Prefix truncation.

use crate::flux::Flux;
use crate::source::Source;
use rivulet_core::state::discard_signal;
use rivulet_core::{EmptySubscription, RivuletError, StageInfo, Subscriber, Subscription};
use std::sync::Arc;

impl<T: Send + 'static> Flux<T> {
    /// Passes through the first `n` values, then cancels the upstream and
    /// completes. `take(0)` cancels immediately and completes without
    /// requesting anything.
    #[must_use]
    pub fn take(&self, n: u64) -> Flux<T> {
        Flux::from_source(TakeSource {
            upstream: self.clone(),
            limit: n,
        })
    }
}

struct TakeSource<T: Send + 'static> {
    upstream: Flux<T>,
    limit: u64,
}

impl<T: Send + 'static> StageInfo for TakeSource<T> {
    fn stage_name(&self) -> &'static str {
        "take"
    }

    fn upstream(&self) -> Option<&dyn StageInfo> {
        Some(self.upstream.source.as_ref())
    }
}

impl<T: Send + 'static> Source<T> for TakeSource<T> {
    fn subscribe(&self, subscriber: Box<dyn Subscriber<T>>) {
        self.upstream.subscribe_boxed(Box::new(TakeSubscriber {
            downstream: subscriber,
            remaining: self.limit,
            upstream: None,
            done: false,
        }));
    }
}

struct TakeSubscriber<T> {
    downstream: Box<dyn Subscriber<T>>,
    remaining: u64,
    upstream: Option<Arc<dyn Subscription>>,
    done: bool,
}

impl<T: Send + 'static> Subscriber<T> for TakeSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        if self.remaining == 0 {
            self.done = true;
            subscription.cancel();
            self.downstream.on_subscribe(Arc::new(EmptySubscription));
            self.downstream.on_complete();
            return;
        }
        self.upstream = Some(Arc::clone(&subscription));
        self.downstream.on_subscribe(subscription);
    }

    fn on_next(&mut self, value: T) {
        if self.done {
            discard_signal("take", "on_next");
            return;
        }
        self.remaining -= 1;
        let last = self.remaining == 0;
        self.downstream.on_next(value);
        if last {
            self.done = true;
            if let Some(upstream) = self.upstream.take() {
                upstream.cancel();
            }
            self.downstream.on_complete();
        }
    }

    fn on_error(&mut self, error: RivuletError) {
        if self.done {
            discard_signal("take", "on_error");
            return;
        }
        self.done = true;
        self.downstream.on_error(error);
    }

    fn on_complete(&mut self) {
        if self.done {
            discard_signal("take", "on_complete");
            return;
        }
        self.done = true;
        self.downstream.on_complete();
    }
}
