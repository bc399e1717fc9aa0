// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Core protocol for the rivulet reactive runtime.
//!
//! This crate defines the contract every rivulet producer and consumer obeys:
//! the [`Subscriber`]/[`Subscription`] signal pair, atomic demand accounting
//! ([`Demand`], [`demand::UNBOUNDED`]), the per-subscription lifecycle state
//! machine ([`StateCell`]), the [`RivuletError`] taxonomy, the abstract
//! execution-context capability ([`Scheduler`]/[`Worker`]) and read-only stage
//! introspection ([`StageInfo`]).
//!
//! The operator surface lives in `rivulet-flux`; this crate intentionally
//! carries no operators, only the protocol they all speak.

pub mod demand;
pub mod error;
pub mod scheduler;
pub mod stage_info;
pub mod state;
pub mod subscriber;
pub mod subscription;

pub use self::demand::Demand;
pub use self::error::{Result, RivuletError};
pub use self::scheduler::{ScheduledHandle, Scheduler, Task, Worker};
pub use self::stage_info::StageInfo;
pub use self::state::{LifecycleState, StateCell};
pub use self::subscriber::Subscriber;
pub use self::subscription::{EmptySubscription, Subscription};
