// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Whole-chain composition, at assembly time and at subscription time.

use crate::flux::Flux;
use crate::source::Source;
use rivulet_core::{EmptySubscription, Result, StageInfo, Subscriber};
use std::marker::PhantomData;
use std::sync::Arc;

impl<T: Send + 'static> Flux<T> {
    /// Applies `f` to the whole chain once, now, at assembly time.
    ///
    /// An `Err` from `f` surfaces to the caller immediately; no subscriber is
    /// involved and nothing was subscribed yet.
    pub fn transform<R, F>(self, f: F) -> Result<Flux<R>>
    where
        R: Send + 'static,
        F: FnOnce(Flux<T>) -> Result<Flux<R>>,
    {
        f(self)
    }

    /// Applies `f` to the whole chain once per subscriber, at subscription
    /// time.
    ///
    /// Each subscriber therefore gets its own rebuilt chain; an `Err` from
    /// `f` terminates only that subscriber with `on_error`.
    pub fn compose<R, F>(self, f: F) -> Flux<R>
    where
        R: Send + 'static,
        F: Fn(Flux<T>) -> Result<Flux<R>> + Send + Sync + 'static,
    {
        Flux::from_source(ComposeSource {
            upstream: self,
            f,
            _marker: PhantomData,
        })
    }
}

struct ComposeSource<T: Send + 'static, R, F> {
    upstream: Flux<T>,
    f: F,
    _marker: PhantomData<fn() -> R>,
}

impl<T, R, F> StageInfo for ComposeSource<T, R, F>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(Flux<T>) -> Result<Flux<R>> + Send + Sync + 'static,
{
    fn stage_name(&self) -> &'static str {
        "compose"
    }

    fn upstream(&self) -> Option<&dyn StageInfo> {
        Some(self.upstream.source.as_ref())
    }
}

impl<T, R, F> Source<R> for ComposeSource<T, R, F>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(Flux<T>) -> Result<Flux<R>> + Send + Sync + 'static,
{
    fn subscribe(&self, mut subscriber: Box<dyn Subscriber<R>>) {
        match (self.f)(self.upstream.clone()) {
            Ok(flux) => flux.subscribe_boxed(subscriber),
            Err(error) => {
                subscriber.on_subscribe(Arc::new(EmptySubscription));
                subscriber.on_error(error);
            }
        }
    }
}
