// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Abstract execution-context capability.
//!
//! The core never owns a thread pool or a timer; stages that need to move
//! work off the calling thread (parallel rails, timed batching triggers)
//! consume this capability and leave the concrete implementation to
//! `rivulet-runtime`.

use std::sync::Arc;
use std::time::Duration;

/// A unit of work handed to a worker.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Handle for a delayed task; cancelling before the delay elapses prevents
/// execution.
pub trait ScheduledHandle: Send + Sync {
    /// Prevents the task from running if it has not started yet. Idempotent.
    fn cancel(&self);

    /// `true` once [`ScheduledHandle::cancel`] has been called.
    fn is_cancelled(&self) -> bool;
}

/// A serial execution unit.
///
/// Tasks submitted to one worker run in FIFO order, one at a time, as if on a
/// dedicated sequential thread of control. Different workers may run
/// concurrently with respect to each other.
pub trait Worker: Send + Sync {
    /// Enqueues `task` for execution after all previously submitted tasks.
    fn schedule(&self, task: Task);

    /// Enqueues `task` to run after `delay`, cancelable until it starts.
    ///
    /// Delayed tasks keep the FIFO guarantee relative to tasks submitted
    /// after the delay elapses, not relative to submission time.
    fn schedule_after(&self, delay: Duration, task: Task) -> Arc<dyn ScheduledHandle>;
}

/// Factory for independent serial workers.
///
/// A stage binds a worker once (e.g. one per parallel rail) and the binding
/// never migrates.
pub trait Scheduler: Send + Sync {
    /// Creates a fresh worker, independent of all previously created ones.
    fn create_worker(&self) -> Arc<dyn Worker>;
}
