// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Boundary-sequence-delimited windowing and buffering.
//!
//! A second sequence drives batch closure: every value it emits closes the
//! current batch and opens the next one, regardless of the main sequence's
//! timing. Completion or failure of either sequence terminates the whole
//! stage. Combined with an interval source this gives time-based batching
//! without the stage itself knowing about clocks.

use crate::flux::Flux;
use crate::processor::Processor;
use crate::source::Source;
use rivulet_core::demand::UNBOUNDED;
use rivulet_core::{RivuletError, StageInfo, Subscriber, Subscription};
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::sync::Arc;

impl<T: Send + 'static> Flux<T> {
    /// Windows delimited by the values of `boundary`. The first window is
    /// open from subscription; each boundary value closes the current
    /// window (possibly empty) and opens the next.
    #[must_use]
    pub fn window_when<B: Send + 'static>(&self, boundary: Flux<B>) -> Flux<Flux<T>> {
        Flux::from_source(WindowWhenSource {
            upstream: self.clone(),
            boundary,
        })
    }

    /// Buffers delimited by the values of `boundary`. Each boundary value
    /// emits the values collected since the previous one; a boundary firing
    /// with nothing collected emits an empty `Vec`.
    #[must_use]
    pub fn buffer_when<B: Send + 'static>(&self, boundary: Flux<B>) -> Flux<Vec<T>> {
        Flux::from_source(BufferWhenSource {
            upstream: self.clone(),
            boundary,
        })
    }
}

struct WindowWhenSource<T: Send + 'static, B: Send + 'static> {
    upstream: Flux<T>,
    boundary: Flux<B>,
}

impl<T: Send + 'static, B: Send + 'static> StageInfo for WindowWhenSource<T, B> {
    fn stage_name(&self) -> &'static str {
        "window_when"
    }

    fn upstream(&self) -> Option<&dyn StageInfo> {
        Some(self.upstream.source.as_ref())
    }
}

struct WindowWhenState<T: Send + 'static> {
    current: Option<Processor<T>>,
    main_sub: Option<Arc<dyn Subscription>>,
    boundary_sub: Option<Arc<dyn Subscription>>,
    done: bool,
}

impl<T: Send + 'static> WindowWhenState<T> {
    /// Marks the stage finished and returns what must be signalled/cancelled
    /// outside the lock.
    fn finish(
        &mut self,
    ) -> (
        Option<Processor<T>>,
        Option<Arc<dyn Subscription>>,
        Option<Arc<dyn Subscription>>,
    ) {
        self.done = true;
        (
            self.current.take(),
            self.main_sub.take(),
            self.boundary_sub.take(),
        )
    }
}

impl<T: Send + 'static, B: Send + 'static> Source<Flux<T>> for WindowWhenSource<T, B> {
    fn subscribe(&self, subscriber: Box<dyn Subscriber<Flux<T>>>) {
        let outer: Processor<Flux<T>> = Processor::new();

        // The first window is open from the start.
        let first = Processor::new();
        outer.push(first.flux());
        let state = Arc::new(Mutex::new(WindowWhenState {
            current: Some(first),
            main_sub: None,
            boundary_sub: None,
            done: false,
        }));

        {
            let state = Arc::clone(&state);
            outer.set_on_cancel(move || {
                let (_, main_sub, boundary_sub) = state.lock().finish();
                if let Some(sub) = main_sub {
                    sub.cancel();
                }
                if let Some(sub) = boundary_sub {
                    sub.cancel();
                }
            });
        }

        self.boundary
            .subscribe_boxed(Box::new(WindowBoundarySubscriber {
                outer: outer.clone(),
                state: Arc::clone(&state),
                _marker: PhantomData,
            }));
        self.upstream.subscribe_boxed(Box::new(WindowMainSubscriber {
            outer: outer.clone(),
            state,
        }));
        outer.subscribe_boxed(subscriber);
    }
}

struct WindowMainSubscriber<T: Send + 'static> {
    outer: Processor<Flux<T>>,
    state: Arc<Mutex<WindowWhenState<T>>>,
}

impl<T: Send + 'static> Subscriber<T> for WindowMainSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        let cancelled = {
            let mut state = self.state.lock();
            if state.done {
                true
            } else {
                state.main_sub = Some(Arc::clone(&subscription));
                false
            }
        };
        if cancelled {
            subscription.cancel();
        } else {
            subscription.request(UNBOUNDED);
        }
    }

    fn on_next(&mut self, value: T) {
        let current = self.state.lock().current.clone();
        if let Some(current) = current {
            current.push(value);
        }
    }

    fn on_error(&mut self, error: RivuletError) {
        let (current, _, boundary_sub) = self.state.lock().finish();
        if let Some(current) = current {
            current.fail(error.clone());
        }
        self.outer.fail(error);
        if let Some(sub) = boundary_sub {
            sub.cancel();
        }
    }

    fn on_complete(&mut self) {
        let (current, _, boundary_sub) = self.state.lock().finish();
        if let Some(current) = current {
            current.complete();
        }
        self.outer.complete();
        if let Some(sub) = boundary_sub {
            sub.cancel();
        }
    }
}

struct WindowBoundarySubscriber<T: Send + 'static, B> {
    outer: Processor<Flux<T>>,
    state: Arc<Mutex<WindowWhenState<T>>>,
    _marker: PhantomData<fn(B)>,
}

impl<T: Send + 'static, B: Send + 'static> Subscriber<B> for WindowBoundarySubscriber<T, B> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        let cancelled = {
            let mut state = self.state.lock();
            if state.done {
                true
            } else {
                state.boundary_sub = Some(Arc::clone(&subscription));
                false
            }
        };
        if cancelled {
            subscription.cancel();
        } else {
            subscription.request(UNBOUNDED);
        }
    }

    fn on_next(&mut self, _value: B) {
        let (closed, opened) = {
            let mut state = self.state.lock();
            if state.done {
                return;
            }
            let next = Processor::new();
            let closed = state.current.replace(next.clone());
            (closed, next)
        };
        if let Some(closed) = closed {
            closed.complete();
        }
        self.outer.push(opened.flux());
    }

    fn on_error(&mut self, error: RivuletError) {
        let (current, main_sub, _) = self.state.lock().finish();
        if let Some(current) = current {
            current.fail(error.clone());
        }
        self.outer.fail(error);
        if let Some(sub) = main_sub {
            sub.cancel();
        }
    }

    fn on_complete(&mut self) {
        // A finished boundary means no window can ever close again; treat
        // it as end of the whole stage.
        let (current, main_sub, _) = self.state.lock().finish();
        if let Some(current) = current {
            current.complete();
        }
        self.outer.complete();
        if let Some(sub) = main_sub {
            sub.cancel();
        }
    }
}

struct BufferWhenSource<T: Send + 'static, B: Send + 'static> {
    upstream: Flux<T>,
    boundary: Flux<B>,
}

impl<T: Send + 'static, B: Send + 'static> StageInfo for BufferWhenSource<T, B> {
    fn stage_name(&self) -> &'static str {
        "buffer_when"
    }

    fn upstream(&self) -> Option<&dyn StageInfo> {
        Some(self.upstream.source.as_ref())
    }
}

struct BufferWhenState<T> {
    current: Vec<T>,
    main_sub: Option<Arc<dyn Subscription>>,
    boundary_sub: Option<Arc<dyn Subscription>>,
    done: bool,
}

impl<T> BufferWhenState<T> {
    fn finish(
        &mut self,
    ) -> (
        Vec<T>,
        Option<Arc<dyn Subscription>>,
        Option<Arc<dyn Subscription>>,
    ) {
        self.done = true;
        (
            std::mem::take(&mut self.current),
            self.main_sub.take(),
            self.boundary_sub.take(),
        )
    }
}

impl<T: Send + 'static, B: Send + 'static> Source<Vec<T>> for BufferWhenSource<T, B> {
    fn subscribe(&self, subscriber: Box<dyn Subscriber<Vec<T>>>) {
        let outer: Processor<Vec<T>> = Processor::new();
        let state = Arc::new(Mutex::new(BufferWhenState {
            current: Vec::new(),
            main_sub: None,
            boundary_sub: None,
            done: false,
        }));

        {
            let state = Arc::clone(&state);
            outer.set_on_cancel(move || {
                let (_, main_sub, boundary_sub) = state.lock().finish();
                if let Some(sub) = main_sub {
                    sub.cancel();
                }
                if let Some(sub) = boundary_sub {
                    sub.cancel();
                }
            });
        }

        self.boundary
            .subscribe_boxed(Box::new(BufferBoundarySubscriber {
                outer: outer.clone(),
                state: Arc::clone(&state),
                _marker: PhantomData,
            }));
        self.upstream.subscribe_boxed(Box::new(BufferMainSubscriber {
            outer: outer.clone(),
            state,
        }));
        outer.subscribe_boxed(subscriber);
    }
}

struct BufferMainSubscriber<T: Send + 'static> {
    outer: Processor<Vec<T>>,
    state: Arc<Mutex<BufferWhenState<T>>>,
}

impl<T: Send + 'static> Subscriber<T> for BufferMainSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        let cancelled = {
            let mut state = self.state.lock();
            if state.done {
                true
            } else {
                state.main_sub = Some(Arc::clone(&subscription));
                false
            }
        };
        if cancelled {
            subscription.cancel();
        } else {
            subscription.request(UNBOUNDED);
        }
    }

    fn on_next(&mut self, value: T) {
        let mut state = self.state.lock();
        if !state.done {
            state.current.push(value);
        }
    }

    fn on_error(&mut self, error: RivuletError) {
        let (_, _, boundary_sub) = self.state.lock().finish();
        self.outer.fail(error);
        if let Some(sub) = boundary_sub {
            sub.cancel();
        }
    }

    fn on_complete(&mut self) {
        let (remainder, _, boundary_sub) = self.state.lock().finish();
        if !remainder.is_empty() {
            self.outer.push(remainder);
        }
        self.outer.complete();
        if let Some(sub) = boundary_sub {
            sub.cancel();
        }
    }
}

struct BufferBoundarySubscriber<T: Send + 'static, B> {
    outer: Processor<Vec<T>>,
    state: Arc<Mutex<BufferWhenState<T>>>,
    _marker: PhantomData<fn(B)>,
}

impl<T: Send + 'static, B: Send + 'static> Subscriber<B> for BufferBoundarySubscriber<T, B> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        let cancelled = {
            let mut state = self.state.lock();
            if state.done {
                true
            } else {
                state.boundary_sub = Some(Arc::clone(&subscription));
                false
            }
        };
        if cancelled {
            subscription.cancel();
        } else {
            subscription.request(UNBOUNDED);
        }
    }

    fn on_next(&mut self, _value: B) {
        let batch = {
            let mut state = self.state.lock();
            if state.done {
                return;
            }
            std::mem::take(&mut state.current)
        };
        self.outer.push(batch);
    }

    fn on_error(&mut self, error: RivuletError) {
        let (_, main_sub, _) = self.state.lock().finish();
        self.outer.fail(error);
        if let Some(sub) = main_sub {
            sub.cancel();
        }
    }

    fn on_complete(&mut self) {
        let (remainder, main_sub, _) = self.state.lock().finish();
        if !remainder.is_empty() {
            self.outer.push(remainder);
        }
        self.outer.complete();
        if let Some(sub) = main_sub {
            sub.cancel();
        }
    }
}
