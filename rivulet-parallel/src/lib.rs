// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Parallel rail processing for rivulet sequences.
//!
//! [`ParallelFlux`] splits one sequence into a fixed number of rails,
//! dispatching values round-robin. Rail-local operators run on every rail
//! independently; [`ParallelFlux::run_on`] binds each rail to its own serial
//! worker so rails actually execute concurrently. The split ends either by
//! merging back into one sequence ([`ParallelFlux::sequential`]), by
//! exposing the rails as groups ([`ParallelFlux::groups`]) or by attaching
//! one subscriber per rail ([`ParallelFlux::subscribe_each`]).

mod dispatch;
mod groups;
mod parallel;
mod rail_ops;
mod run_on;
mod sequential;

pub use self::parallel::{ParallelFlux, ParallelFluxExt, ParallelSource};
