// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Inline, same-thread execution.

use rivulet_core::{ScheduledHandle, Scheduler, Task, Worker};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Runs every task inline on the thread that submits it.
///
/// The serial-worker guarantee holds trivially. Delayed tasks block the
/// calling thread for the delay, which makes this scheduler deterministic
/// but unsuitable for timed stages outside of tests; pair those with
/// [`TokioScheduler`](crate::TokioScheduler) instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn create_worker(&self) -> Arc<dyn Worker> {
        Arc::new(ImmediateWorker)
    }
}

struct ImmediateWorker;

impl Worker for ImmediateWorker {
    fn schedule(&self, task: Task) {
        task();
    }

    fn schedule_after(&self, delay: Duration, task: Task) -> Arc<dyn ScheduledHandle> {
        std::thread::sleep(delay);
        let handle = Arc::new(DoneHandle {
            cancelled: AtomicBool::new(false),
        });
        task();
        handle
    }
}

struct DoneHandle {
    cancelled: AtomicBool,
}

impl ScheduledHandle for DoneHandle {
    fn cancel(&self) {
        // The task already ran inline; only the flag is recorded.
        self.cancelled.store(true, Ordering::Release);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
