// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The uniform stage capability.

use rivulet_core::{StageInfo, Subscriber};

/// One assembled stage: anything a subscriber can be attached to.
///
/// Every operator, source and processor implements this single capability,
/// which keeps the operator surface enumerable: a stage owns (at most) one
/// upstream and exposes the protocol downstream. Assembly-time chains are
/// `Arc`-linked `Source` values; all per-subscriber state is created inside
/// [`Source::subscribe`].
pub trait Source<T: Send + 'static>: StageInfo + 'static {
    /// Attaches `subscriber`, creating this stage's per-subscriber state and
    /// (for operator stages) subscribing upstream in turn.
    ///
    /// Never fails synchronously: errors raised while setting up (e.g. a
    /// failing `defer` factory) are delivered as the subscriber's terminal
    /// `on_error` signal.
    fn subscribe(&self, subscriber: Box<dyn Subscriber<T>>);
}
