// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Sequence assembly and operators for the rivulet reactive runtime.
//!
//! [`Flux<T>`] is an assembled, immutable chain of operator stages over a
//! root source. Subscribing builds a fresh per-subscriber state tree and
//! starts the demand-driven exchange defined in `rivulet-core`.
//!
//! The crate covers:
//! - cold and hot root sources ([`Flux::from_iter`], [`Flux::just`],
//!   [`Flux::defer`], [`Flux::interval`], ...)
//! - assembly-time vs subscription-time composition ([`Flux::transform`],
//!   [`Flux::compose`])
//! - the connectable multicast family ([`Flux::publish`], [`Flux::replay`],
//!   [`ConnectableFlux`])
//! - the batching engine ([`Flux::group_by`], the `window_*` and `buffer_*`
//!   families)
//! - a bridge into the `futures` ecosystem ([`Flux::into_stream`])

pub mod batch;
pub mod connectable;
pub mod drain;
pub mod flux;
pub mod into_stream;
pub mod ops;
pub mod processor;
pub mod source;
pub mod sources;

pub use self::batch::GroupedFlux;
pub use self::connectable::{ConnectableFlux, Connection, ReplayConfig};
pub use self::drain::DrainGate;
pub use self::flux::Flux;
pub use self::into_stream::FluxStream;
pub use self::processor::Processor;
pub use self::source::Source;
