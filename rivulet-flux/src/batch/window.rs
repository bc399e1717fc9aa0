// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Count-based windowing.

use crate::flux::Flux;
use crate::processor::Processor;
use crate::source::Source;
use rivulet_core::demand::UNBOUNDED;
use rivulet_core::{RivuletError, StageInfo, Subscriber, Subscription};
use std::collections::VecDeque;
use std::sync::Arc;

impl<T: Clone + Send + 'static> Flux<T> {
    /// Cuts the sequence into consecutive windows of `max_size` values.
    /// The final window may be shorter; it is emitted on completion.
    #[must_use]
    pub fn window(&self, max_size: usize) -> Flux<Flux<T>> {
        self.window_with_skip(max_size, max_size)
    }

    /// Generalized windowing: a new window opens every `skip` values and
    /// closes after `max_size` values.
    ///
    /// `skip < max_size` yields overlapping windows (each value is cloned
    /// into every window it belongs to); `skip > max_size` drops the values
    /// that fall between windows. Open windows are completed, possibly
    /// short, when the sequence terminates.
    ///
    /// # Panics
    ///
    /// If `max_size` or `skip` is zero.
    #[must_use]
    pub fn window_with_skip(&self, max_size: usize, skip: usize) -> Flux<Flux<T>> {
        assert!(max_size > 0, "window max_size must be positive");
        assert!(skip > 0, "window skip must be positive");
        Flux::from_source(WindowSource {
            upstream: self.clone(),
            max_size,
            skip,
        })
    }
}

struct WindowSource<T: Send + 'static> {
    upstream: Flux<T>,
    max_size: usize,
    skip: usize,
}

impl<T: Clone + Send + 'static> StageInfo for WindowSource<T> {
    fn stage_name(&self) -> &'static str {
        "window"
    }

    fn upstream(&self) -> Option<&dyn StageInfo> {
        Some(self.upstream.source.as_ref())
    }
}

impl<T: Clone + Send + 'static> Source<Flux<T>> for WindowSource<T> {
    fn subscribe(&self, subscriber: Box<dyn Subscriber<Flux<T>>>) {
        let outer = Processor::new();
        self.upstream.subscribe_boxed(Box::new(WindowSubscriber {
            outer: outer.clone(),
            open: VecDeque::new(),
            index: 0,
            max_size: self.max_size,
            skip: self.skip,
        }));
        outer.subscribe_boxed(subscriber);
    }
}

struct OpenWindow<T: Send + 'static> {
    processor: Processor<T>,
    len: usize,
}

struct WindowSubscriber<T: Send + 'static> {
    outer: Processor<Flux<T>>,
    open: VecDeque<OpenWindow<T>>,
    index: u64,
    max_size: usize,
    skip: usize,
}

impl<T: Clone + Send + 'static> Subscriber<T> for WindowSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        let upstream = Arc::clone(&subscription);
        self.outer.set_on_cancel(move || upstream.cancel());
        subscription.request(UNBOUNDED);
    }

    fn on_next(&mut self, value: T) {
        if self.index % self.skip as u64 == 0 {
            let processor = Processor::new();
            self.outer.push(processor.flux());
            self.open.push_back(OpenWindow { processor, len: 0 });
        }
        self.index += 1;

        for window in &mut self.open {
            window.processor.push(value.clone());
            window.len += 1;
        }
        while self
            .open
            .front()
            .is_some_and(|window| window.len >= self.max_size)
        {
            if let Some(window) = self.open.pop_front() {
                window.processor.complete();
            }
        }
    }

    fn on_error(&mut self, error: RivuletError) {
        for window in self.open.drain(..) {
            window.processor.fail(error.clone());
        }
        self.outer.fail(error);
    }

    fn on_complete(&mut self) {
        for window in self.open.drain(..) {
            window.processor.complete();
        }
        self.outer.complete();
    }
}
