// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Immediately terminating sources.

use crate::flux::Flux;
use crate::source::Source;
use rivulet_core::{EmptySubscription, RivuletError, StageInfo, Subscriber};
use std::marker::PhantomData;
use std::sync::Arc;

impl<T: Send + 'static> Flux<T> {
    /// A sequence that completes without emitting any value.
    #[must_use]
    pub fn empty() -> Self {
        Flux::from_source(EmptySource(PhantomData))
    }

    /// A sequence that terminates every subscriber with a clone of `error`.
    #[must_use]
    pub fn error(error: RivuletError) -> Self {
        Flux::from_source(ErrorSource {
            error,
            _marker: PhantomData,
        })
    }
}

struct EmptySource<T>(PhantomData<fn() -> T>);

impl<T: Send + 'static> StageInfo for EmptySource<T> {
    fn stage_name(&self) -> &'static str {
        "empty"
    }
}

impl<T: Send + 'static> Source<T> for EmptySource<T> {
    fn subscribe(&self, mut subscriber: Box<dyn Subscriber<T>>) {
        subscriber.on_subscribe(Arc::new(EmptySubscription));
        subscriber.on_complete();
    }
}

struct ErrorSource<T> {
    error: RivuletError,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + 'static> StageInfo for ErrorSource<T> {
    fn stage_name(&self) -> &'static str {
        "error"
    }
}

impl<T: Send + 'static> Source<T> for ErrorSource<T> {
    fn subscribe(&self, mut subscriber: Box<dyn Subscriber<T>>) {
        subscriber.on_subscribe(Arc::new(EmptySubscription));
        subscriber.on_error(self.error.clone());
    }
}
