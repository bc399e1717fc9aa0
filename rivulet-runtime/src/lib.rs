// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Concrete [`Scheduler`](rivulet_core::Scheduler) implementations.
//!
//! Stages in `rivulet-flux` and `rivulet-parallel` only depend on the
//! abstract scheduler capability from `rivulet-core`; this crate provides
//! the implementations an application actually runs on:
//!
//! - [`TokioScheduler`]: serial workers multiplexed onto a tokio runtime,
//!   with timer-backed delays. The default choice.
//! - [`ImmediateScheduler`]: runs every task inline on the calling thread.
//!   Deterministic, for tests and for pipelines that want no concurrency.

mod immediate;
mod tokio_scheduler;

pub use self::immediate::ImmediateScheduler;
pub use self::tokio_scheduler::TokioScheduler;
