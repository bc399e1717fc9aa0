// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The batching engine: grouping, windowing and buffering.
//!
//! Three batching families, all built on [`Processor`](crate::Processor)
//! sub-sequences:
//!
//! - **grouping** ([`crate::Flux::group_by`]): demultiplex by key into
//!   concurrent sub-sequences, one per distinct key;
//! - **windowing** (`window*`): cut the sequence into consecutive (possibly
//!   overlapping) sub-sequences;
//! - **buffering** (`buffer*`): like windowing, but each batch materializes
//!   as a `Vec<T>` that is only emitted once closed.
//!
//! Count-based buffers translate downstream demand into a scaled upstream
//! request. Every other stage here requests an unbounded upstream and lets
//! the outer processor absorb the gap, since the value-to-batch ratio is not
//! knowable up front (predicates, boundary sequences, key distribution).

mod boundary;
mod buffer;
mod group_by;
mod predicate;
mod window;

pub use self::group_by::GroupedFlux;
