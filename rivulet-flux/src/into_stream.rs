// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Bridge from a [`Flux`] into a futures [`Stream`].
//!
//! The bridge subscribes with a small prefetch and replenishes one-for-one
//! as values cross the channel, so an async consumer that stops polling
//! stops the upstream after at most the prefetch window. Dropping the
//! stream cancels the subscription.

use crate::flux::Flux;
use futures::Stream;
use futures_channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use parking_lot::Mutex;
use rivulet_core::{Result, RivuletError, Subscriber, Subscription};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

const BRIDGE_PREFETCH: u64 = 32;

enum Event<T> {
    Value(T),
    Terminal(Option<RivuletError>),
}

impl<T: Send + 'static> Flux<T> {
    /// Subscribes and exposes the sequence as an async [`Stream`] of
    /// `Result<T>`. An error terminates the stream after being yielded.
    #[must_use]
    pub fn into_stream(&self) -> FluxStream<T> {
        let (sender, receiver) = mpsc::unbounded();
        let subscription = Arc::new(Mutex::new(None));
        self.subscribe(BridgeSubscriber {
            sender,
            subscription: Arc::clone(&subscription),
            done: false,
        });
        FluxStream {
            receiver,
            subscription,
        }
    }
}

/// Async view over a subscribed sequence. See [`Flux::into_stream`].
pub struct FluxStream<T> {
    receiver: UnboundedReceiver<Event<T>>,
    subscription: Arc<Mutex<Option<Arc<dyn Subscription>>>>,
}

impl<T> Stream for FluxStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.receiver).poll_next(cx) {
            Poll::Ready(Some(Event::Value(value))) => Poll::Ready(Some(Ok(value))),
            Poll::Ready(Some(Event::Terminal(Some(error)))) => Poll::Ready(Some(Err(error))),
            Poll::Ready(Some(Event::Terminal(None)) | None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for FluxStream<T> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.cancel();
        }
    }
}

struct BridgeSubscriber<T> {
    sender: UnboundedSender<Event<T>>,
    subscription: Arc<Mutex<Option<Arc<dyn Subscription>>>>,
    done: bool,
}

impl<T: Send + 'static> Subscriber<T> for BridgeSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        *self.subscription.lock() = Some(Arc::clone(&subscription));
        subscription.request(BRIDGE_PREFETCH);
    }

    fn on_next(&mut self, value: T) {
        if self.done {
            return;
        }
        if self.sender.unbounded_send(Event::Value(value)).is_err() {
            // Receiver dropped; the stream's Drop cancels the subscription.
            self.done = true;
            return;
        }
        let replenish = self.subscription.lock().clone();
        if let Some(subscription) = replenish {
            subscription.request(1);
        }
    }

    fn on_error(&mut self, error: RivuletError) {
        if !self.done {
            self.done = true;
            let _ = self.sender.unbounded_send(Event::Terminal(Some(error)));
        }
    }

    fn on_complete(&mut self) {
        if !self.done {
            self.done = true;
            let _ = self.sender.unbounded_send(Event::Terminal(None));
        }
    }
}
