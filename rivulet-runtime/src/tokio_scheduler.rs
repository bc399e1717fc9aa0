// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Tokio-backed serial workers.

use rivulet_core::{ScheduledHandle, Scheduler, Task, Worker};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedSender};

/// Scheduler whose workers are serial task queues drained by tokio tasks.
///
/// Each worker owns an unbounded channel and one consumer task, so tasks
/// submitted to the same worker run strictly in FIFO order while distinct
/// workers run concurrently on the runtime's thread pool. Delays use the
/// runtime timer; a delayed task is enqueued on its worker when the delay
/// elapses, preserving the worker's serial guarantee.
#[derive(Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Binds to the current tokio runtime.
    ///
    /// # Panics
    ///
    /// If called outside a tokio runtime context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handle: Handle::current(),
        }
    }

    /// Binds to an explicit runtime handle.
    #[must_use]
    pub fn from_handle(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TokioScheduler {
    fn create_worker(&self) -> Arc<dyn Worker> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Task>();
        self.handle.spawn(async move {
            while let Some(task) = receiver.recv().await {
                task();
            }
            tracing::trace!("worker queue closed, consumer task exiting");
        });
        Arc::new(TokioWorker {
            handle: self.handle.clone(),
            sender,
        })
    }
}

struct TokioWorker {
    handle: Handle,
    sender: UnboundedSender<Task>,
}

impl Worker for TokioWorker {
    fn schedule(&self, task: Task) {
        if self.sender.send(task).is_err() {
            tracing::debug!("task submitted to a closed worker, dropping");
        }
    }

    fn schedule_after(&self, delay: Duration, task: Task) -> Arc<dyn ScheduledHandle> {
        let handle = Arc::new(CancelFlag {
            cancelled: AtomicBool::new(false),
        });
        let flag = Arc::clone(&handle);
        let sender = self.sender.clone();
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if flag.is_cancelled() {
                return;
            }
            if sender.send(task).is_err() {
                tracing::debug!("delayed task elapsed on a closed worker, dropping");
            }
        });
        handle
    }
}

struct CancelFlag {
    cancelled: AtomicBool,
}

impl ScheduledHandle for CancelFlag {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
