// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! # Rivulet
//!
//! A backpressure-first reactive stream runtime: demand-driven sequences
//! with connectable multicast, a batching engine and parallel rails.
//!
//! ## Overview
//!
//! Everything starts from a [`Flux`], an assembled chain of operator
//! stages. Nothing runs until a subscriber attaches and grants demand;
//! producers may never deliver more values than were requested. On top of
//! that contract the workspace layers:
//!
//! - **hot and cold sources** ([`Flux::just`], [`Flux::from_iter`],
//!   [`Flux::defer`], [`Flux::interval`])
//! - **connectable multicast** ([`Flux::publish`], [`Flux::replay`],
//!   [`ConnectableFlux`]) with manual, counted and reference-counted
//!   connection
//! - **batching** ([`Flux::group_by`], the `window_*` and `buffer_*`
//!   families)
//! - **parallel rails** ([`ParallelFluxExt::parallel`],
//!   [`ParallelFlux::run_on`], [`ParallelFlux::sequential`])
//! - **async interop** ([`Flux::into_stream`] yields a futures `Stream`)
//!
//! ## Quick start
//!
//! ```rust
//! use rivulet::prelude::*;
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() {
//!     let doubled: Vec<_> = Flux::from_iter(1..=4u32)
//!         .map(|n| n * 2)
//!         .into_stream()
//!         .collect()
//!         .await;
//!     assert_eq!(
//!         doubled.into_iter().collect::<Result<Vec<_>, _>>().unwrap(),
//!         vec![2, 4, 6, 8]
//!     );
//! }
//! ```

pub use rivulet_core::{
    Demand, LifecycleState, Result, RivuletError, ScheduledHandle, Scheduler, StageInfo,
    StateCell, Subscriber, Subscription, Task, Worker,
};
pub use rivulet_core::demand::UNBOUNDED;

pub use rivulet_flux::{
    ConnectableFlux, Connection, Flux, FluxStream, GroupedFlux, Processor, ReplayConfig, Source,
};

pub use rivulet_parallel::{ParallelFlux, ParallelFluxExt};

pub use rivulet_runtime::{ImmediateScheduler, TokioScheduler};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        ConnectableFlux, Flux, ParallelFlux, ParallelFluxExt, ReplayConfig, RivuletError,
        Subscriber, Subscription, TokioScheduler,
    };
}
