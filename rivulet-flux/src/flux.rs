// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The assembled sequence handle.

use crate::source::Source;
use rivulet_core::{StageInfo, Subscriber};
use std::sync::Arc;

/// An assembled, backpressure-governed sequence of `T` values.
///
/// A `Flux` is an immutable chain of stages: each operator call wraps the
/// previous stage in a new one and returns a new handle. Nothing runs at
/// assembly time (except for explicitly hot sources like [`Flux::just`]);
/// all per-subscriber state is created by [`Flux::subscribe`].
///
/// Cloning a `Flux` is cheap and shares the assembled chain, not any
/// subscription state.
pub struct Flux<T: Send + 'static> {
    pub(crate) source: Arc<dyn Source<T>>,
}

impl<T: Send + 'static> Clone for Flux<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Wraps a custom [`Source`] implementation.
    pub fn from_source<S: Source<T>>(source: S) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    pub(crate) fn from_arc(source: Arc<dyn Source<T>>) -> Self {
        Self { source }
    }

    /// Subscribes `subscriber`, starting a fresh execution of the chain for
    /// it. The subscriber receives `on_subscribe` first and must request
    /// demand before any value is delivered.
    pub fn subscribe<S: Subscriber<T> + 'static>(&self, subscriber: S) {
        self.source.subscribe(Box::new(subscriber));
    }

    /// [`Flux::subscribe`] for an already boxed subscriber, avoiding a
    /// second box. Used by stages built outside this crate.
    pub fn subscribe_boxed(&self, subscriber: Box<dyn Subscriber<T>>) {
        self.source.subscribe(subscriber);
    }

    /// Name of the terminal stage of this chain.
    #[must_use]
    pub fn stage_name(&self) -> &'static str {
        self.source.stage_name()
    }

    /// Configured prefetch of the terminal stage, if it requests ahead of
    /// downstream demand.
    #[must_use]
    pub fn prefetch(&self) -> Option<usize> {
        self.source.prefetch()
    }

    /// Name of the immediate upstream stage, or `None` for a root source.
    #[must_use]
    pub fn upstream_name(&self) -> Option<&'static str> {
        self.source.upstream().map(StageInfo::stage_name)
    }

    /// Read-only introspection of the terminal stage, for external tooling.
    /// Walk [`StageInfo::upstream`] to traverse the assembled chain.
    #[must_use]
    pub fn info(&self) -> &dyn StageInfo {
        self.source.as_ref()
    }
}
