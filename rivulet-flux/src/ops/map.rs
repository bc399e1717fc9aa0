// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! One-to-one value transformation.

use crate::flux::Flux;
use crate::source::Source;
use rivulet_core::state::discard_signal;
use rivulet_core::{Result, RivuletError, StageInfo, Subscriber, Subscription};
use std::marker::PhantomData;
use std::sync::Arc;

impl<T: Send + 'static> Flux<T> {
    /// Transforms each value with `f`. One-to-one: demand passes through
    /// unchanged.
    pub fn map<R, F>(&self, f: F) -> Flux<R>
    where
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        Flux::from_source(MapSource {
            upstream: self.clone(),
            f: Arc::new(move |value| Ok(f(value))),
            _marker: PhantomData,
        })
    }

    /// Fallible [`Flux::map`]: an `Err` from `f` cancels the upstream and
    /// terminates this subscriber with the error. Values already delivered
    /// stand.
    pub fn try_map<R, F>(&self, f: F) -> Flux<R>
    where
        R: Send + 'static,
        F: Fn(T) -> Result<R> + Send + Sync + 'static,
    {
        Flux::from_source(MapSource {
            upstream: self.clone(),
            f: Arc::new(f),
            _marker: PhantomData,
        })
    }
}

type MapFn<T, R> = Arc<dyn Fn(T) -> Result<R> + Send + Sync>;

struct MapSource<T: Send + 'static, R> {
    upstream: Flux<T>,
    f: MapFn<T, R>,
    _marker: PhantomData<fn() -> R>,
}

impl<T: Send + 'static, R: Send + 'static> StageInfo for MapSource<T, R> {
    fn stage_name(&self) -> &'static str {
        "map"
    }

    fn upstream(&self) -> Option<&dyn StageInfo> {
        Some(self.upstream.source.as_ref())
    }
}

impl<T: Send + 'static, R: Send + 'static> Source<R> for MapSource<T, R> {
    fn subscribe(&self, subscriber: Box<dyn Subscriber<R>>) {
        self.upstream.subscribe_boxed(Box::new(MapSubscriber {
            downstream: subscriber,
            f: Arc::clone(&self.f),
            upstream: None,
            done: false,
        }));
    }
}

struct MapSubscriber<T, R> {
    downstream: Box<dyn Subscriber<R>>,
    f: MapFn<T, R>,
    upstream: Option<Arc<dyn Subscription>>,
    done: bool,
}

impl<T: Send + 'static, R: Send + 'static> Subscriber<T> for MapSubscriber<T, R> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        self.upstream = Some(Arc::clone(&subscription));
        // Demand is one-to-one; hand the upstream subscription straight down.
        self.downstream.on_subscribe(subscription);
    }

    fn on_next(&mut self, value: T) {
        if self.done {
            discard_signal("map", "on_next");
            return;
        }
        match (self.f)(value) {
            Ok(mapped) => self.downstream.on_next(mapped),
            Err(error) => {
                self.done = true;
                if let Some(upstream) = self.upstream.take() {
                    upstream.cancel();
                }
                self.downstream.on_error(error);
            }
        }
    }

    fn on_error(&mut self, error: RivuletError) {
        if self.done {
            discard_signal("map", "on_error");
            return;
        }
        self.done = true;
        self.downstream.on_error(error);
    }

    fn on_complete(&mut self) {
        if self.done {
            discard_signal("map", "on_complete");
            return;
        }
        self.done = true;
        self.downstream.on_complete();
    }
}
