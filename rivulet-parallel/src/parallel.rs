// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The parallel sequence handle and its entry point.

use crate::dispatch::DispatchSource;
use rivulet_core::Subscriber;
use rivulet_flux::Flux;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Default per-rail prefetch for the round-robin dispatcher.
pub const DEFAULT_RAIL_PREFETCH: usize = 128;

/// A parallel producer: a fixed set of rails subscribed together.
///
/// Implementations subscribe all rails in one call so that per-rail state is
/// created atomically with respect to the shared upstream.
pub trait ParallelSource<T: Send + 'static>: Send + Sync + 'static {
    /// Number of rails. Stable for the lifetime of the source.
    fn parallelism(&self) -> usize;

    /// Subscribes one subscriber per rail. `subscribers.len()` must equal
    /// [`ParallelSource::parallelism`].
    fn subscribe_rails(&self, subscribers: Vec<Box<dyn Subscriber<T>>>);
}

/// An assembled parallel chain over a fixed number of rails.
pub struct ParallelFlux<T: Send + 'static> {
    pub(crate) source: Arc<dyn ParallelSource<T>>,
}

impl<T: Send + 'static> Clone for ParallelFlux<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<T: Send + 'static> ParallelFlux<T> {
    pub(crate) fn from_source<S: ParallelSource<T>>(source: S) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Number of rails.
    #[must_use]
    pub fn parallelism(&self) -> usize {
        self.source.parallelism()
    }

    /// Attaches one subscriber per rail, produced by `factory` with the rail
    /// index. This starts the upstream.
    pub fn subscribe_each<F>(&self, mut factory: F)
    where
        F: FnMut(usize) -> Box<dyn Subscriber<T>>,
    {
        let subscribers = (0..self.parallelism()).map(&mut factory).collect();
        self.source.subscribe_rails(subscribers);
    }
}

/// Entry point from a plain [`Flux`] into rail processing.
pub trait ParallelFluxExt<T: Send + 'static> {
    /// Splits into `rails` round-robin rails with the default per-rail
    /// prefetch of [`DEFAULT_RAIL_PREFETCH`].
    fn parallel(&self, rails: usize) -> ParallelFlux<T>;

    /// [`ParallelFluxExt::parallel`] with one rail per available CPU.
    fn parallel_auto(&self) -> ParallelFlux<T>;

    /// [`ParallelFluxExt::parallel`] with an explicit per-rail prefetch.
    fn parallel_with_prefetch(&self, rails: usize, prefetch: usize) -> ParallelFlux<T>;
}

impl<T: Send + 'static> ParallelFluxExt<T> for Flux<T> {
    fn parallel(&self, rails: usize) -> ParallelFlux<T> {
        self.parallel_with_prefetch(rails, DEFAULT_RAIL_PREFETCH)
    }

    fn parallel_auto(&self) -> ParallelFlux<T> {
        let rails = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        self.parallel(rails)
    }

    fn parallel_with_prefetch(&self, rails: usize, prefetch: usize) -> ParallelFlux<T> {
        assert!(rails > 0, "parallelism must be positive");
        assert!(prefetch > 0, "rail prefetch must be positive");
        ParallelFlux::from_source(DispatchSource::new(self.clone(), rails, prefetch))
    }
}
