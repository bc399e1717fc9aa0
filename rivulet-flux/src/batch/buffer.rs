// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Count-based buffering with scaled demand.
//!
//! Unlike windows, a buffer only reaches the subscriber once it is closed,
//! so downstream demand translates exactly into upstream demand: `n`
//! requested buffers need `(n - 1) * skip + max_size` upstream values. The
//! [`ScaledSubscription`] performs that translation, which keeps count-based
//! buffering fully backpressured end to end.

use crate::flux::Flux;
use crate::source::Source;
use rivulet_core::demand::UNBOUNDED;
use rivulet_core::state::discard_signal;
use rivulet_core::{RivuletError, StageInfo, Subscriber, Subscription};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

impl<T: Clone + Send + 'static> Flux<T> {
    /// Collects consecutive values into `Vec`s of `max_size`. A final,
    /// shorter buffer is emitted on completion if any values are pending.
    #[must_use]
    pub fn buffer(&self, max_size: usize) -> Flux<Vec<T>> {
        self.buffer_with_skip(max_size, max_size)
    }

    /// Generalized count buffering: a new buffer opens every `skip` values
    /// and is emitted once it holds `max_size` values. Overlap and sampling
    /// follow the same rules as [`Flux::window_with_skip`].
    ///
    /// # Panics
    ///
    /// If `max_size` or `skip` is zero.
    #[must_use]
    pub fn buffer_with_skip(&self, max_size: usize, skip: usize) -> Flux<Vec<T>> {
        assert!(max_size > 0, "buffer max_size must be positive");
        assert!(skip > 0, "buffer skip must be positive");
        Flux::from_source(BufferSource {
            upstream: self.clone(),
            max_size,
            skip,
        })
    }
}

struct BufferSource<T: Send + 'static> {
    upstream: Flux<T>,
    max_size: usize,
    skip: usize,
}

impl<T: Clone + Send + 'static> StageInfo for BufferSource<T> {
    fn stage_name(&self) -> &'static str {
        "buffer"
    }

    fn upstream(&self) -> Option<&dyn StageInfo> {
        Some(self.upstream.source.as_ref())
    }
}

impl<T: Clone + Send + 'static> Source<Vec<T>> for BufferSource<T> {
    fn subscribe(&self, subscriber: Box<dyn Subscriber<Vec<T>>>) {
        self.upstream.subscribe_boxed(Box::new(BufferSubscriber {
            downstream: subscriber,
            open: VecDeque::new(),
            index: 0,
            max_size: self.max_size,
            skip: self.skip,
            done: false,
        }));
    }
}

/// Multiplies downstream demand by `factor`, with a one-time surplus that
/// covers the first buffer's overlap tail.
struct ScaledSubscription {
    upstream: Arc<dyn Subscription>,
    factor: u64,
    extra_once: AtomicU64,
}

impl Subscription for ScaledSubscription {
    fn request(&self, n: u64) {
        if n == UNBOUNDED {
            self.upstream.request(UNBOUNDED);
            return;
        }
        let extra = self.extra_once.swap(0, Ordering::AcqRel);
        self.upstream
            .request(n.saturating_mul(self.factor).saturating_add(extra));
    }

    fn cancel(&self) {
        self.upstream.cancel();
    }
}

struct BufferSubscriber<T> {
    downstream: Box<dyn Subscriber<Vec<T>>>,
    open: VecDeque<Vec<T>>,
    index: u64,
    max_size: usize,
    skip: usize,
    done: bool,
}

impl<T: Clone + Send + 'static> Subscriber<T> for BufferSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        self.downstream.on_subscribe(Arc::new(ScaledSubscription {
            upstream: subscription,
            factor: self.skip as u64,
            extra_once: AtomicU64::new((self.max_size.saturating_sub(self.skip)) as u64),
        }));
    }

    fn on_next(&mut self, value: T) {
        if self.done {
            discard_signal("buffer", "on_next");
            return;
        }
        if self.index % self.skip as u64 == 0 {
            self.open.push_back(Vec::with_capacity(self.max_size));
        }
        self.index += 1;

        for buffer in &mut self.open {
            buffer.push(value.clone());
        }
        while self
            .open
            .front()
            .is_some_and(|buffer| buffer.len() >= self.max_size)
        {
            if let Some(buffer) = self.open.pop_front() {
                self.downstream.on_next(buffer);
            }
        }
    }

    fn on_error(&mut self, error: RivuletError) {
        if self.done {
            discard_signal("buffer", "on_error");
            return;
        }
        self.done = true;
        self.open.clear();
        self.downstream.on_error(error);
    }

    fn on_complete(&mut self) {
        if self.done {
            discard_signal("buffer", "on_complete");
            return;
        }
        self.done = true;
        for buffer in self.open.drain(..) {
            if !buffer.is_empty() {
                self.downstream.on_next(buffer);
            }
        }
        self.downstream.on_complete();
    }
}
