// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Rail-local operators, applied to every rail independently.

use crate::parallel::{ParallelFlux, ParallelSource};
use rivulet_core::{RivuletError, Subscriber, Subscription};
use std::sync::Arc;

impl<T: Send + 'static> ParallelFlux<T> {
    /// Transforms every value on the rail it travels; rails never exchange
    /// values.
    pub fn map<R, F>(&self, f: F) -> ParallelFlux<R>
    where
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        ParallelFlux::from_source(RailMapSource {
            inner: Arc::clone(&self.source),
            f: Arc::new(f),
        })
    }

    /// Filters every rail with the same predicate, replenishing rail demand
    /// for dropped values.
    pub fn filter<F>(&self, predicate: F) -> ParallelFlux<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        ParallelFlux::from_source(RailFilterSource {
            inner: Arc::clone(&self.source),
            predicate: Arc::new(predicate),
        })
    }
}

struct RailMapSource<T: Send + 'static, R> {
    inner: Arc<dyn ParallelSource<T>>,
    f: Arc<dyn Fn(T) -> R + Send + Sync>,
}

impl<T: Send + 'static, R: Send + 'static> ParallelSource<R> for RailMapSource<T, R> {
    fn parallelism(&self) -> usize {
        self.inner.parallelism()
    }

    fn subscribe_rails(&self, subscribers: Vec<Box<dyn Subscriber<R>>>) {
        let wrapped = subscribers
            .into_iter()
            .map(|downstream| {
                Box::new(RailMapSubscriber {
                    downstream,
                    f: Arc::clone(&self.f),
                }) as Box<dyn Subscriber<T>>
            })
            .collect();
        self.inner.subscribe_rails(wrapped);
    }
}

struct RailMapSubscriber<T, R> {
    downstream: Box<dyn Subscriber<R>>,
    f: Arc<dyn Fn(T) -> R + Send + Sync>,
}

impl<T: Send + 'static, R: Send + 'static> Subscriber<T> for RailMapSubscriber<T, R> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        self.downstream.on_subscribe(subscription);
    }

    fn on_next(&mut self, value: T) {
        self.downstream.on_next((self.f)(value));
    }

    fn on_error(&mut self, error: RivuletError) {
        self.downstream.on_error(error);
    }

    fn on_complete(&mut self) {
        self.downstream.on_complete();
    }
}

struct RailFilterSource<T: Send + 'static> {
    inner: Arc<dyn ParallelSource<T>>,
    predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T: Send + 'static> ParallelSource<T> for RailFilterSource<T> {
    fn parallelism(&self) -> usize {
        self.inner.parallelism()
    }

    fn subscribe_rails(&self, subscribers: Vec<Box<dyn Subscriber<T>>>) {
        let wrapped = subscribers
            .into_iter()
            .map(|downstream| {
                Box::new(RailFilterSubscriber {
                    downstream,
                    predicate: Arc::clone(&self.predicate),
                    upstream: None,
                }) as Box<dyn Subscriber<T>>
            })
            .collect();
        self.inner.subscribe_rails(wrapped);
    }
}

struct RailFilterSubscriber<T> {
    downstream: Box<dyn Subscriber<T>>,
    predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
    upstream: Option<Arc<dyn Subscription>>,
}

impl<T: Send + 'static> Subscriber<T> for RailFilterSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        self.upstream = Some(Arc::clone(&subscription));
        self.downstream.on_subscribe(subscription);
    }

    fn on_next(&mut self, value: T) {
        if (self.predicate)(&value) {
            self.downstream.on_next(value);
        } else if let Some(upstream) = &self.upstream {
            upstream.request(1);
        }
    }

    fn on_error(&mut self, error: RivuletError) {
        self.downstream.on_error(error);
    }

    fn on_complete(&mut self) {
        self.downstream.on_complete();
    }
}
