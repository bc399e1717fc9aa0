// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Test utilities for the rivulet workspace.
//!
//! The central piece is [`TestProbe`], a recording subscriber with explicit
//! demand control and blocking waits, used by the workspace's own test
//! suites to assert on signal order, delivered values and terminal state.

pub mod helpers;
pub mod probe;

pub use self::helpers::{failing_flux, tracked_range};
pub use self::probe::TestProbe;
