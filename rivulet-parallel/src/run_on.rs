// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Binding rails to serial workers.

use crate::parallel::{ParallelFlux, ParallelSource};
use parking_lot::Mutex;
use rivulet_core::{RivuletError, Scheduler, Subscriber, Subscription, Worker};
use std::sync::Arc;

impl<T: Send + 'static> ParallelFlux<T> {
    /// Moves each rail's signal delivery onto its own worker from
    /// `scheduler`.
    ///
    /// `on_subscribe` is delivered inline (subscriptions are thread-safe);
    /// every later signal of a rail is queued as a task on that rail's
    /// worker, so the worker's FIFO guarantee preserves per-rail signal
    /// order while distinct rails run concurrently.
    #[must_use]
    pub fn run_on(&self, scheduler: Arc<dyn Scheduler>) -> ParallelFlux<T> {
        ParallelFlux::from_source(RunOnSource {
            inner: Arc::clone(&self.source),
            scheduler,
        })
    }
}

struct RunOnSource<T: Send + 'static> {
    inner: Arc<dyn ParallelSource<T>>,
    scheduler: Arc<dyn Scheduler>,
}

impl<T: Send + 'static> ParallelSource<T> for RunOnSource<T> {
    fn parallelism(&self) -> usize {
        self.inner.parallelism()
    }

    fn subscribe_rails(&self, subscribers: Vec<Box<dyn Subscriber<T>>>) {
        let wrapped = subscribers
            .into_iter()
            .map(|downstream| {
                Box::new(WorkerSubscriber {
                    worker: self.scheduler.create_worker(),
                    downstream: Arc::new(Mutex::new(downstream)),
                }) as Box<dyn Subscriber<T>>
            })
            .collect();
        self.inner.subscribe_rails(wrapped);
    }
}

struct WorkerSubscriber<T> {
    worker: Arc<dyn Worker>,
    downstream: Arc<Mutex<Box<dyn Subscriber<T>>>>,
}

impl<T: Send + 'static> Subscriber<T> for WorkerSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        self.downstream.lock().on_subscribe(subscription);
    }

    fn on_next(&mut self, value: T) {
        let downstream = Arc::clone(&self.downstream);
        self.worker
            .schedule(Box::new(move || downstream.lock().on_next(value)));
    }

    fn on_error(&mut self, error: RivuletError) {
        let downstream = Arc::clone(&self.downstream);
        self.worker
            .schedule(Box::new(move || downstream.lock().on_error(error)));
    }

    fn on_complete(&mut self) {
        let downstream = Arc::clone(&self.downstream);
        self.worker
            .schedule(Box::new(move || downstream.lock().on_complete()));
    }
}
