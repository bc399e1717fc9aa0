// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Replay history configuration.

use std::time::{Duration, Instant};

/// Bounds on the history a replay stage retains.
///
/// With no bound configured the full history is kept. When a bound is
/// exceeded the oldest entries are evicted silently; eviction never fails the
/// sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayConfig {
    max_size: Option<usize>,
    max_age: Option<Duration>,
}

impl ReplayConfig {
    /// Retain the entire history, unbounded.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            max_size: None,
            max_age: None,
        }
    }

    /// Retain at most the `n` most recent values.
    #[must_use]
    pub const fn max_size(mut self, n: usize) -> Self {
        self.max_size = Some(n);
        self
    }

    /// Retain only values younger than `age`.
    #[must_use]
    pub const fn max_age(mut self, age: Duration) -> Self {
        self.max_age = Some(age);
        self
    }

    pub(crate) fn evict<T>(&self, history: &mut std::collections::VecDeque<(Instant, T)>) {
        if let Some(max_size) = self.max_size {
            while history.len() > max_size {
                history.pop_front();
            }
        }
        if let Some(max_age) = self.max_age {
            let now = Instant::now();
            while history
                .front()
                .is_some_and(|(stamp, _)| now.duration_since(*stamp) > max_age)
            {
                history.pop_front();
            }
        }
    }
}
