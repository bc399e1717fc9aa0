// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Root sources: where chains begin.
//!
//! Cold sources ([`crate::Flux::from_iter`], [`crate::Flux::defer`],
//! [`crate::Flux::interval`]) perform their work once per subscription; zero
//! subscribers means zero work. Hot sources ([`crate::Flux::just`]) capture
//! their value once, at assembly, and every subscriber observes the same
//! captured value.

mod defer;
mod interval;
mod iter;
mod terminal;
