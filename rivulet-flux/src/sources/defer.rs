// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Subscription-time sequence construction.

use crate::flux::Flux;
use crate::source::Source;
use rivulet_core::{EmptySubscription, Result, StageInfo, Subscriber};
use std::marker::PhantomData;
use std::sync::Arc;

impl<T: Send + 'static> Flux<T> {
    /// Defers sequence construction to subscription time.
    ///
    /// `factory` runs once per subscriber, so side effects inside it (and
    /// inside whatever chain it assembles) happen per subscription rather
    /// than once at assembly. A factory error terminates that subscriber
    /// with `on_error` after a no-op `on_subscribe`; other subscribers are
    /// unaffected.
    pub fn defer<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Flux<T>> + Send + Sync + 'static,
    {
        Flux::from_source(DeferSource {
            factory,
            _marker: PhantomData,
        })
    }
}

struct DeferSource<T, F> {
    factory: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> StageInfo for DeferSource<T, F>
where
    T: Send + 'static,
    F: Fn() -> Result<Flux<T>> + Send + Sync + 'static,
{
    fn stage_name(&self) -> &'static str {
        "defer"
    }
}

impl<T, F> Source<T> for DeferSource<T, F>
where
    T: Send + 'static,
    F: Fn() -> Result<Flux<T>> + Send + Sync + 'static,
{
    fn subscribe(&self, mut subscriber: Box<dyn Subscriber<T>>) {
        match (self.factory)() {
            Ok(flux) => flux.subscribe_boxed(subscriber),
            Err(error) => {
                subscriber.on_subscribe(Arc::new(EmptySubscription));
                subscriber.on_error(error);
            }
        }
    }
}
