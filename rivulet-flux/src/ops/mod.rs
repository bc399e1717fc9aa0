// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Per-value operators and sequence composition.
//!
//! Every operator here follows the same shape: an assembly-time `*Source`
//! wrapping the upstream chain, and a per-subscription `*Subscriber` that
//! relays signals downstream with the operator's semantics applied. Operator
//! state lives in the subscriber and is created fresh for every subscription.

mod compose;
mod filter;
mod map;
mod take;
