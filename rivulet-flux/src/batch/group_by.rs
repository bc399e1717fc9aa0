// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Key-based demultiplexing into concurrent sub-sequences.

use crate::flux::Flux;
use crate::processor::Processor;
use crate::source::Source;
use rivulet_core::demand::UNBOUNDED;
use rivulet_core::{RivuletError, StageInfo, Subscriber, Subscription};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// One keyed sub-sequence produced by [`Flux::group_by`].
pub struct GroupedFlux<K, T: Send + 'static> {
    key: K,
    flux: Flux<T>,
}

impl<K: Clone, T: Send + 'static> Clone for GroupedFlux<K, T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            flux: self.flux.clone(),
        }
    }
}

impl<K, T: Send + 'static> GroupedFlux<K, T> {
    /// Builds a grouped view over an existing sequence, for stages that
    /// produce keyed sub-sequences of their own (e.g. parallel rails).
    pub fn new(key: K, flux: Flux<T>) -> Self {
        Self { key, flux }
    }

    /// The key shared by every value of this group.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The group's value sequence.
    #[must_use]
    pub fn flux(&self) -> Flux<T> {
        self.flux.clone()
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Splits the sequence into concurrent groups keyed by `key_fn`.
    ///
    /// A group is opened (and emitted downstream) when its key is first
    /// seen, and every later value with the same key is routed into it.
    /// Groups buffer without bound until consumed. Cancelling a group
    /// retires its key; if the key shows up again a fresh group is opened.
    /// Cancelling the outer sequence cancels the upstream, but groups
    /// already handed out keep draining what they buffered.
    pub fn group_by<K, F>(&self, key_fn: F) -> Flux<GroupedFlux<K, T>>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Flux::from_source(GroupBySource {
            upstream: self.clone(),
            key_fn: Arc::new(key_fn),
        })
    }
}

type KeyFn<T, K> = Arc<dyn Fn(&T) -> K + Send + Sync>;

struct GroupBySource<T: Send + 'static, K> {
    upstream: Flux<T>,
    key_fn: KeyFn<T, K>,
}

impl<T, K> StageInfo for GroupBySource<T, K>
where
    T: Send + 'static,
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn stage_name(&self) -> &'static str {
        "group_by"
    }

    fn upstream(&self) -> Option<&dyn StageInfo> {
        Some(self.upstream.source.as_ref())
    }
}

impl<T, K> Source<GroupedFlux<K, T>> for GroupBySource<T, K>
where
    T: Send + 'static,
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn subscribe(&self, subscriber: Box<dyn Subscriber<GroupedFlux<K, T>>>) {
        let outer = Processor::new();
        self.upstream.subscribe_boxed(Box::new(GroupBySubscriber {
            outer: outer.clone(),
            groups: Arc::new(Mutex::new(HashMap::new())),
            key_fn: Arc::clone(&self.key_fn),
            upstream: None,
        }));
        outer.subscribe_boxed(subscriber);
    }
}

struct GroupBySubscriber<T, K>
where
    T: Send + 'static,
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    outer: Processor<GroupedFlux<K, T>>,
    groups: Arc<Mutex<HashMap<K, Processor<T>>>>,
    key_fn: KeyFn<T, K>,
    upstream: Option<Arc<dyn Subscription>>,
}

impl<T, K> Subscriber<T> for GroupBySubscriber<T, K>
where
    T: Send + 'static,
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        self.upstream = Some(Arc::clone(&subscription));
        // Cancelling the outer sequence stops the demultiplexer at the
        // source; live groups keep their buffered backlog.
        let upstream = Arc::clone(&subscription);
        self.outer.set_on_cancel(move || upstream.cancel());
        subscription.request(UNBOUNDED);
    }

    fn on_next(&mut self, value: T) {
        let key = (self.key_fn)(&value);
        let (processor, opened) = {
            let mut groups = self.groups.lock();
            match groups.get(&key) {
                Some(processor) => (processor.clone(), false),
                None => {
                    let processor = Processor::new();
                    let groups_ref = Arc::clone(&self.groups);
                    let hook_key = key.clone();
                    // A cancelled key restarts as a fresh group on its next
                    // value.
                    processor.set_on_cancel(move || {
                        groups_ref.lock().remove(&hook_key);
                    });
                    groups.insert(key.clone(), processor.clone());
                    (processor, true)
                }
            }
        };
        // Deliveries run outside the map lock; a group's subscriber may
        // itself cancel another group.
        processor.push(value);
        if opened {
            self.outer.push(GroupedFlux {
                key,
                flux: processor.flux(),
            });
        }
    }

    fn on_error(&mut self, error: RivuletError) {
        let groups: Vec<Processor<T>> = self.groups.lock().drain().map(|(_, p)| p).collect();
        for processor in groups {
            processor.fail(error.clone());
        }
        self.outer.fail(error);
    }

    fn on_complete(&mut self) {
        let groups: Vec<Processor<T>> = self.groups.lock().drain().map(|(_, p)| p).collect();
        for processor in groups {
            processor.complete();
        }
        self.outer.complete();
    }
}
