// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Connectable multicast: `publish`, `replay` and the connection lifecycle.
//!
//! A [`ConnectableFlux`] decouples subscribing from starting the upstream.
//! Subscribers register first and accumulate; the single upstream
//! subscription is opened by [`ConnectableFlux::connect`] (or automatically,
//! via [`ConnectableFlux::auto_connect`] / [`ConnectableFlux::ref_count`])
//! and every received value fans out to all registered subscribers.
//!
//! Each subscriber is backed by its own [`Processor`] slot, so a slow
//! subscriber buffers in its slot instead of blocking its siblings. For
//! `publish`, the shared upstream is paced by the slowest slot: the stage
//! requests in `prefetch`-sized batches and only re-requests once the
//! minimum cumulative consumption across slots catches up. `replay`
//! additionally retains (bounded, per [`ReplayConfig`]) history and starts
//! late subscribers with it; its upstream runs unbounded since history
//! retention makes slow-consumer pacing meaningless.
//!
//! A terminal signal is sticky: after the upstream terminates, every future
//! subscriber immediately observes (history and) the same terminal signal,
//! and `connect` becomes inert.

mod replay;

pub use self::replay::ReplayConfig;

use crate::flux::Flux;
use crate::processor::Processor;
use crate::source::Source;
use rivulet_core::demand::UNBOUNDED;
use rivulet_core::state::discard_signal;
use rivulet_core::{RivuletError, StageInfo, Subscriber, Subscription};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Default upstream prefetch for `publish`.
pub const DEFAULT_PREFETCH: usize = 256;

impl<T: Clone + Send + Sync + 'static> Flux<T> {
    /// Multicasts this sequence to any number of subscribers, starting the
    /// upstream only on [`ConnectableFlux::connect`]. Uses the default
    /// prefetch of [`DEFAULT_PREFETCH`].
    #[must_use]
    pub fn publish(&self) -> ConnectableFlux<T> {
        self.publish_with_prefetch(DEFAULT_PREFETCH)
    }

    /// [`Flux::publish`] with an explicit upstream prefetch amount.
    #[must_use]
    pub fn publish_with_prefetch(&self, prefetch: usize) -> ConnectableFlux<T> {
        ConnectableFlux::new(self.clone(), prefetch, None)
    }

    /// Multicast with history: late subscribers first receive the retained
    /// history (bounded by `config`), then live values.
    #[must_use]
    pub fn replay(&self, config: ReplayConfig) -> ConnectableFlux<T> {
        ConnectableFlux::new(self.clone(), DEFAULT_PREFETCH, Some(config))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unconnected,
    Connected,
    Terminated,
}

struct Slot<T: Send + 'static> {
    id: u64,
    processor: Processor<T>,
    /// Cumulative position in the upstream sequence this slot has consumed
    /// up to. Updated outside the registry lock by the consume hook.
    consumed: Arc<AtomicU64>,
}

struct Registry<T: Send + 'static> {
    phase: Phase,
    /// Bumped on every connect; signals and disconnects from an older cycle
    /// are ignored.
    cycle: u64,
    next_id: u64,
    slots: Vec<Slot<T>>,
    upstream_sub: Option<Arc<dyn Subscription>>,
    requested: u64,
    delivered: u64,
    terminal: Option<Option<RivuletError>>,
    history: VecDeque<(Instant, T)>,
}

struct ConnectableInner<T: Clone + Send + Sync + 'static> {
    upstream: Flux<T>,
    prefetch: usize,
    replay: Option<ReplayConfig>,
    /// Non-zero enables ref-count mode: disconnect when active slots drop
    /// below this threshold.
    ref_count_threshold: AtomicU64,
    registry: Mutex<Registry<T>>,
}

/// A multicast sequence whose upstream starts on demand.
pub struct ConnectableFlux<T: Clone + Send + Sync + 'static> {
    inner: Arc<ConnectableInner<T>>,
}

impl<T: Clone + Send + Sync + 'static> Clone for ConnectableFlux<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> ConnectableFlux<T> {
    fn new(upstream: Flux<T>, prefetch: usize, replay: Option<ReplayConfig>) -> Self {
        Self {
            inner: Arc::new(ConnectableInner {
                upstream,
                prefetch,
                replay,
                ref_count_threshold: AtomicU64::new(0),
                registry: Mutex::new(Registry {
                    phase: Phase::Unconnected,
                    cycle: 0,
                    next_id: 0,
                    slots: Vec::new(),
                    upstream_sub: None,
                    requested: 0,
                    delivered: 0,
                    terminal: None,
                    history: VecDeque::new(),
                }),
            }),
        }
    }

    /// The subscriber-facing view. Subscribing registers a slot; no upstream
    /// work happens until connection.
    #[must_use]
    pub fn flux(&self) -> Flux<T> {
        Flux::from_arc(Arc::new(ConnectableSource {
            inner: Arc::clone(&self.inner),
        }))
    }

    /// Opens the single upstream subscription and starts fanning values out
    /// to the registered slots.
    ///
    /// Idempotent while connected: a second call returns a handle to the
    /// live connection. After the upstream terminated the returned handle is
    /// inert.
    pub fn connect(&self) -> Connection {
        self.inner.connect()
    }

    /// Automatic connection: the returned sequence connects the upstream as
    /// soon as `subscribers` subscriptions have been made, and never
    /// disconnects on its own. `subscribers == 0` connects immediately.
    #[must_use]
    pub fn auto_connect(&self, subscribers: u64) -> Flux<T> {
        let source = AutoConnectSource {
            inner: Arc::clone(&self.inner),
            threshold: subscribers,
            seen: AtomicU64::new(0),
            connection: Mutex::new(None),
        };
        if subscribers == 0 {
            *source.connection.lock() = Some(self.inner.connect());
        }
        Flux::from_arc(Arc::new(source))
    }

    /// Reference-counted connection: connects once `subscribers`
    /// subscriptions are active and disconnects the upstream when
    /// cancellations bring the count back below the threshold. Surviving
    /// subscribers stay registered and are served again by a later
    /// reconnect.
    #[must_use]
    pub fn ref_count(&self, subscribers: u64) -> Flux<T> {
        self.inner
            .ref_count_threshold
            .store(subscribers.max(1), Ordering::Release);
        Flux::from_arc(Arc::new(RefCountSource {
            inner: Arc::clone(&self.inner),
            threshold: subscribers.max(1),
        }))
    }
}

impl<T: Clone + Send + Sync + 'static> ConnectableInner<T> {
    fn connect(self: &Arc<Self>) -> Connection {
        let cycle = {
            let mut registry = self.registry.lock();
            match registry.phase {
                Phase::Terminated => return Connection::inert(),
                Phase::Connected => {
                    let this = Arc::clone(self);
                    let cycle = registry.cycle;
                    return Connection::new(move || this.disconnect(cycle));
                }
                Phase::Unconnected => {}
            }
            registry.phase = Phase::Connected;
            registry.cycle += 1;
            registry.requested = 0;
            registry.delivered = 0;
            for slot in &registry.slots {
                // Backlog of a previously severed connection is discarded;
                // the new cycle starts clean for every surviving slot.
                slot.processor.clear_queued();
                slot.consumed.store(0, Ordering::Release);
            }
            registry.cycle
        };
        tracing::debug!(cycle, "connectable upstream connecting");

        self.upstream.subscribe_boxed(Box::new(FanOutSubscriber {
            inner: Arc::clone(self),
            cycle,
        }));

        let this = Arc::clone(self);
        Connection::new(move || this.disconnect(cycle))
    }

    fn disconnect(&self, cycle: u64) {
        let upstream_sub = {
            let mut registry = self.registry.lock();
            if registry.cycle != cycle || registry.phase != Phase::Connected {
                return;
            }
            registry.phase = Phase::Unconnected;
            registry.upstream_sub.take()
        };
        tracing::debug!(cycle, "connectable upstream disconnecting");
        if let Some(sub) = upstream_sub {
            sub.cancel();
        }
    }

    /// Requests more from the upstream when the slowest slot has consumed
    /// enough of the previous batch. Replay stages run unbounded and never
    /// re-request.
    fn maybe_request(&self) {
        let (sub, extra) = {
            let mut registry = self.registry.lock();
            if registry.phase != Phase::Connected {
                return;
            }
            let Some(sub) = registry.upstream_sub.clone() else {
                return;
            };
            let min_consumed = registry
                .slots
                .iter()
                .map(|slot| slot.consumed.load(Ordering::Acquire))
                .min()
                .unwrap_or(registry.delivered);
            let target = min_consumed.saturating_add(self.prefetch as u64);
            if target <= registry.requested {
                return;
            }
            let extra = target - registry.requested;
            registry.requested = target;
            (sub, extra)
        };
        sub.request(extra);
    }

    fn remove_slot(self: &Arc<Self>, id: u64) {
        let disconnect_cycle = {
            let mut registry = self.registry.lock();
            registry.slots.retain(|slot| slot.id != id);
            let threshold = self.ref_count_threshold.load(Ordering::Acquire);
            if threshold > 0
                && registry.phase == Phase::Connected
                && (registry.slots.len() as u64) < threshold
            {
                Some(registry.cycle)
            } else {
                None
            }
        };
        if let Some(cycle) = disconnect_cycle {
            self.disconnect(cycle);
        } else {
            // A slow slot leaving may unblock pacing for the rest.
            self.maybe_request();
        }
    }
}

/// Handle to a live upstream connection.
///
/// Dropping the handle leaves the connection open; only
/// [`Connection::disconnect`] severs it.
pub struct Connection {
    disconnect: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Connection {
    fn new(disconnect: impl FnOnce() + Send + 'static) -> Self {
        Self {
            disconnect: Mutex::new(Some(Box::new(disconnect))),
        }
    }

    fn inert() -> Self {
        Self {
            disconnect: Mutex::new(None),
        }
    }

    /// Cancels the upstream subscription and returns the stage to the
    /// unconnected phase. Idempotent; registered subscribers stay registered
    /// and resume on a later connect.
    pub fn disconnect(&self) {
        let hook = self.disconnect.lock().take();
        if let Some(hook) = hook {
            hook();
        }
    }
}

struct ConnectableSource<T: Clone + Send + Sync + 'static> {
    inner: Arc<ConnectableInner<T>>,
}

impl<T: Clone + Send + Sync + 'static> StageInfo for ConnectableSource<T> {
    fn stage_name(&self) -> &'static str {
        if self.inner.replay.is_some() {
            "replay"
        } else {
            "publish"
        }
    }

    fn prefetch(&self) -> Option<usize> {
        if self.inner.replay.is_some() {
            None
        } else {
            Some(self.inner.prefetch)
        }
    }

    fn upstream(&self) -> Option<&dyn StageInfo> {
        Some(self.inner.upstream.source.as_ref())
    }
}

impl<T: Clone + Send + Sync + 'static> Source<T> for ConnectableSource<T> {
    fn subscribe(&self, subscriber: Box<dyn Subscriber<T>>) {
        let processor = Processor::new();
        let terminal = {
            let mut registry = self.inner.registry.lock();
            if let Some(config) = &self.inner.replay {
                config.evict(&mut registry.history);
            }
            let history: Vec<T> = if self.inner.replay.is_some() {
                registry.history.iter().map(|(_, v)| v.clone()).collect()
            } else {
                Vec::new()
            };

            if registry.phase == Phase::Terminated {
                for value in history {
                    processor.push(value);
                }
                Some(registry.terminal.clone().flatten())
            } else {
                let id = registry.next_id;
                registry.next_id += 1;
                // A joining slot has, by definition, consumed everything
                // already fanned out before it arrived.
                let baseline = registry.delivered.saturating_sub(history.len() as u64);
                let consumed = Arc::new(AtomicU64::new(baseline));
                registry.slots.push(Slot {
                    id,
                    processor: processor.clone(),
                    consumed: Arc::clone(&consumed),
                });
                // History is queued before the registry lock is released;
                // a fan-out value racing past the new slot would otherwise
                // land ahead of it. The processor has no subscriber yet, so
                // these pushes only enqueue.
                for value in history {
                    processor.push(value);
                }
                drop(registry);

                let inner = Arc::clone(&self.inner);
                processor.set_on_consume(move |n| {
                    consumed.fetch_add(n, Ordering::AcqRel);
                    inner.maybe_request();
                });
                let inner = Arc::clone(&self.inner);
                processor.set_on_cancel(move || inner.remove_slot(id));
                None
            }
        };

        if let Some(terminal) = terminal {
            match terminal {
                Some(error) => processor.fail(error),
                None => processor.complete(),
            }
        }
        processor.subscribe_boxed(subscriber);
    }
}

struct FanOutSubscriber<T: Clone + Send + Sync + 'static> {
    inner: Arc<ConnectableInner<T>>,
    cycle: u64,
}

impl<T: Clone + Send + Sync + 'static> FanOutSubscriber<T> {
    fn live_slots(&self, registry: &Registry<T>) -> Option<Vec<Processor<T>>> {
        if registry.cycle != self.cycle || registry.phase == Phase::Unconnected {
            return None;
        }
        Some(
            registry
                .slots
                .iter()
                .map(|slot| slot.processor.clone())
                .collect(),
        )
    }
}

impl<T: Clone + Send + Sync + 'static> Subscriber<T> for FanOutSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        let initial = {
            let mut registry = self.inner.registry.lock();
            if registry.cycle != self.cycle || registry.phase != Phase::Connected {
                drop(registry);
                subscription.cancel();
                return;
            }
            registry.upstream_sub = Some(Arc::clone(&subscription));
            if self.inner.replay.is_some() {
                registry.requested = UNBOUNDED;
                UNBOUNDED
            } else {
                registry.requested = self.inner.prefetch as u64;
                self.inner.prefetch as u64
            }
        };
        subscription.request(initial);
    }

    fn on_next(&mut self, value: T) {
        let slots = {
            let mut registry = self.inner.registry.lock();
            let Some(slots) = self.live_slots(&registry) else {
                discard_signal("publish", "on_next");
                return;
            };
            registry.delivered += 1;
            if let Some(config) = &self.inner.replay {
                registry.history.push_back((Instant::now(), value.clone()));
                config.evict(&mut registry.history);
            }
            slots
        };
        for processor in slots {
            processor.push(value.clone());
        }
    }

    fn on_error(&mut self, error: RivuletError) {
        let slots = {
            let mut registry = self.inner.registry.lock();
            let Some(slots) = self.live_slots(&registry) else {
                discard_signal("publish", "on_error");
                return;
            };
            registry.phase = Phase::Terminated;
            registry.terminal = Some(Some(error.clone()));
            registry.upstream_sub = None;
            registry.slots.clear();
            slots
        };
        for processor in slots {
            processor.fail(error.clone());
        }
    }

    fn on_complete(&mut self) {
        let slots = {
            let mut registry = self.inner.registry.lock();
            let Some(slots) = self.live_slots(&registry) else {
                discard_signal("publish", "on_complete");
                return;
            };
            registry.phase = Phase::Terminated;
            registry.terminal = Some(None);
            registry.upstream_sub = None;
            registry.slots.clear();
            slots
        };
        for processor in slots {
            processor.complete();
        }
    }
}

struct AutoConnectSource<T: Clone + Send + Sync + 'static> {
    inner: Arc<ConnectableInner<T>>,
    threshold: u64,
    seen: AtomicU64,
    connection: Mutex<Option<Connection>>,
}

impl<T: Clone + Send + Sync + 'static> StageInfo for AutoConnectSource<T> {
    fn stage_name(&self) -> &'static str {
        "auto_connect"
    }

    fn upstream(&self) -> Option<&dyn StageInfo> {
        Some(self.inner.upstream.source.as_ref())
    }
}

impl<T: Clone + Send + Sync + 'static> Source<T> for AutoConnectSource<T> {
    fn subscribe(&self, subscriber: Box<dyn Subscriber<T>>) {
        ConnectableSource {
            inner: Arc::clone(&self.inner),
        }
        .subscribe(subscriber);
        let seen = self.seen.fetch_add(1, Ordering::AcqRel) + 1;
        if seen == self.threshold {
            *self.connection.lock() = Some(self.inner.connect());
        }
    }
}

struct RefCountSource<T: Clone + Send + Sync + 'static> {
    inner: Arc<ConnectableInner<T>>,
    threshold: u64,
}

impl<T: Clone + Send + Sync + 'static> StageInfo for RefCountSource<T> {
    fn stage_name(&self) -> &'static str {
        "ref_count"
    }

    fn upstream(&self) -> Option<&dyn StageInfo> {
        Some(self.inner.upstream.source.as_ref())
    }
}

impl<T: Clone + Send + Sync + 'static> Source<T> for RefCountSource<T> {
    fn subscribe(&self, subscriber: Box<dyn Subscriber<T>>) {
        ConnectableSource {
            inner: Arc::clone(&self.inner),
        }
        .subscribe(subscriber);
        let should_connect = {
            let registry = self.inner.registry.lock();
            registry.phase == Phase::Unconnected
                && registry.slots.len() as u64 >= self.threshold
        };
        if should_connect {
            // The connection is owned by the stage itself; ref-count
            // disconnection happens through slot removal.
            let _ = self.inner.connect();
        }
    }
}
