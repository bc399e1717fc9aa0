// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Predicate-delimited windowing and buffering.
//!
//! `*_while` treats a failing value as a pure delimiter: the value is
//! dropped and the current batch closes. `*_until` includes the triggering
//! value in the batch it closes. Windows always close the in-progress
//! window on completion, even when it is empty, because a window is a
//! sub-sequence that was logically open; buffers are materialized `Vec`s
//! and empty ones are never emitted.

use crate::flux::Flux;
use crate::processor::Processor;
use crate::source::Source;
use rivulet_core::demand::UNBOUNDED;
use rivulet_core::{RivuletError, StageInfo, Subscriber, Subscription};
use std::sync::Arc;

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum DelimiterMode {
    /// Close on predicate failure; the failing value is dropped.
    WhileHolds,
    /// Close on predicate success; the matching value closes its own batch.
    UntilMatches,
}

impl<T: Send + 'static> Flux<T> {
    /// Windows of consecutive values for which `predicate` holds. A value
    /// failing the predicate is dropped and closes the current window, so a
    /// run of failing values produces a run of empty windows.
    pub fn window_while<F>(&self, predicate: F) -> Flux<Flux<T>>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Flux::from_source(PredicateWindowSource {
            upstream: self.clone(),
            predicate: Arc::new(predicate),
            mode: DelimiterMode::WhileHolds,
        })
    }

    /// Windows delimited by values matching `predicate`; the matching value
    /// is the last element of the window it closes.
    pub fn window_until<F>(&self, predicate: F) -> Flux<Flux<T>>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Flux::from_source(PredicateWindowSource {
            upstream: self.clone(),
            predicate: Arc::new(predicate),
            mode: DelimiterMode::UntilMatches,
        })
    }

    /// Buffers of consecutive values for which `predicate` holds. Failing
    /// values are dropped; empty buffers are never emitted.
    pub fn buffer_while<F>(&self, predicate: F) -> Flux<Vec<T>>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Flux::from_source(PredicateBufferSource {
            upstream: self.clone(),
            predicate: Arc::new(predicate),
            mode: DelimiterMode::WhileHolds,
        })
    }

    /// Buffers delimited by values matching `predicate`; the matching value
    /// is the last element of the buffer it closes.
    pub fn buffer_until<F>(&self, predicate: F) -> Flux<Vec<T>>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Flux::from_source(PredicateBufferSource {
            upstream: self.clone(),
            predicate: Arc::new(predicate),
            mode: DelimiterMode::UntilMatches,
        })
    }
}

struct PredicateWindowSource<T: Send + 'static> {
    upstream: Flux<T>,
    predicate: Predicate<T>,
    mode: DelimiterMode,
}

impl<T: Send + 'static> StageInfo for PredicateWindowSource<T> {
    fn stage_name(&self) -> &'static str {
        match self.mode {
            DelimiterMode::WhileHolds => "window_while",
            DelimiterMode::UntilMatches => "window_until",
        }
    }

    fn upstream(&self) -> Option<&dyn StageInfo> {
        Some(self.upstream.source.as_ref())
    }
}

impl<T: Send + 'static> Source<Flux<T>> for PredicateWindowSource<T> {
    fn subscribe(&self, subscriber: Box<dyn Subscriber<Flux<T>>>) {
        let outer = Processor::new();
        self.upstream
            .subscribe_boxed(Box::new(PredicateWindowSubscriber {
                outer: outer.clone(),
                current: None,
                predicate: Arc::clone(&self.predicate),
                mode: self.mode,
            }));
        outer.subscribe_boxed(subscriber);
    }
}

struct PredicateWindowSubscriber<T: Send + 'static> {
    outer: Processor<Flux<T>>,
    /// The logically-always-open current window, realized lazily so a
    /// window nobody will ever see a value in still costs nothing until it
    /// has to be closed.
    current: Option<Processor<T>>,
    predicate: Predicate<T>,
    mode: DelimiterMode,
}

impl<T: Send + 'static> PredicateWindowSubscriber<T> {
    fn realize(&mut self) -> Processor<T> {
        if let Some(current) = &self.current {
            return current.clone();
        }
        let processor = Processor::new();
        self.outer.push(processor.flux());
        self.current = Some(processor.clone());
        processor
    }
}

impl<T: Send + 'static> Subscriber<T> for PredicateWindowSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        let upstream = Arc::clone(&subscription);
        self.outer.set_on_cancel(move || upstream.cancel());
        subscription.request(UNBOUNDED);
    }

    fn on_next(&mut self, value: T) {
        match self.mode {
            DelimiterMode::WhileHolds => {
                if (self.predicate)(&value) {
                    self.realize().push(value);
                } else {
                    let window = self.realize();
                    window.complete();
                    self.current = None;
                }
            }
            DelimiterMode::UntilMatches => {
                let close = (self.predicate)(&value);
                let window = self.realize();
                window.push(value);
                if close {
                    window.complete();
                    self.current = None;
                }
            }
        }
    }

    fn on_error(&mut self, error: RivuletError) {
        if let Some(current) = self.current.take() {
            current.fail(error.clone());
        }
        self.outer.fail(error);
    }

    fn on_complete(&mut self) {
        match self.mode {
            DelimiterMode::WhileHolds => {
                // The current window was logically open, so it is emitted
                // even when empty.
                let window = self.realize();
                window.complete();
                self.current = None;
            }
            DelimiterMode::UntilMatches => {
                if let Some(current) = self.current.take() {
                    current.complete();
                }
            }
        }
        self.outer.complete();
    }
}

struct PredicateBufferSource<T: Send + 'static> {
    upstream: Flux<T>,
    predicate: Predicate<T>,
    mode: DelimiterMode,
}

impl<T: Send + 'static> StageInfo for PredicateBufferSource<T> {
    fn stage_name(&self) -> &'static str {
        match self.mode {
            DelimiterMode::WhileHolds => "buffer_while",
            DelimiterMode::UntilMatches => "buffer_until",
        }
    }

    fn upstream(&self) -> Option<&dyn StageInfo> {
        Some(self.upstream.source.as_ref())
    }
}

impl<T: Send + 'static> Source<Vec<T>> for PredicateBufferSource<T> {
    fn subscribe(&self, subscriber: Box<dyn Subscriber<Vec<T>>>) {
        let outer = Processor::new();
        self.upstream
            .subscribe_boxed(Box::new(PredicateBufferSubscriber {
                outer: outer.clone(),
                current: Vec::new(),
                predicate: Arc::clone(&self.predicate),
                mode: self.mode,
            }));
        outer.subscribe_boxed(subscriber);
    }
}

struct PredicateBufferSubscriber<T: Send + 'static> {
    outer: Processor<Vec<T>>,
    current: Vec<T>,
    predicate: Predicate<T>,
    mode: DelimiterMode,
}

impl<T: Send + 'static> PredicateBufferSubscriber<T> {
    fn emit_current(&mut self) {
        if !self.current.is_empty() {
            self.outer.push(std::mem::take(&mut self.current));
        }
    }
}

impl<T: Send + 'static> Subscriber<T> for PredicateBufferSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        let upstream = Arc::clone(&subscription);
        self.outer.set_on_cancel(move || upstream.cancel());
        subscription.request(UNBOUNDED);
    }

    fn on_next(&mut self, value: T) {
        match self.mode {
            DelimiterMode::WhileHolds => {
                if (self.predicate)(&value) {
                    self.current.push(value);
                } else {
                    self.emit_current();
                }
            }
            DelimiterMode::UntilMatches => {
                let close = (self.predicate)(&value);
                self.current.push(value);
                if close {
                    self.emit_current();
                }
            }
        }
    }

    fn on_error(&mut self, error: RivuletError) {
        self.current.clear();
        self.outer.fail(error);
    }

    fn on_complete(&mut self) {
        self.emit_current();
        self.outer.complete();
    }
}
